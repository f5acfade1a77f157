//! Command line interface definition

use clap::{Parser, Subcommand};
use modsync_types::ColorChoice;
use std::path::PathBuf;

/// modsync - select project modules and keep their repositories in sync
#[derive(Parser)]
#[command(name = "modsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Select project modules and keep their repositories in sync")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to a file in the log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Package manifest to read
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Project root that relative paths resolve against
    #[arg(long, global = true, value_name = "PATH")]
    pub project_root: Option<PathBuf>,

    /// Show what install or reconfigure would do without changing anything
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List packages and whether they are selected
    #[command(alias = "ls")]
    List {
        /// Only show packages whose name or description contains this text
        filter: Option<String>,
    },

    /// Add packages to the selection
    Select {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Remove packages from the selection
    Deselect {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Sync every selected package and run the module handlers
    #[command(alias = "i")]
    Install {
        /// Run again even if the installation already completed
        #[arg(long)]
        force: bool,
    },

    /// Remove deselected packages and install newly selected ones
    Reconfigure,

    /// Delete checkouts and generated files, then forget the stored state
    Reset,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}

impl Commands {
    /// Get command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Commands::List { .. } => "list",
            Commands::Select { .. } => "select",
            Commands::Deselect { .. } => "deselect",
            Commands::Install { .. } => "install",
            Commands::Reconfigure => "reconfigure",
            Commands::Reset => "reset",
            Commands::Config { .. } => "config",
        }
    }

    /// Whether the command syncs repositories and can be interrupted
    pub fn is_long_running(&self) -> bool {
        matches!(self, Commands::Install { .. } | Commands::Reconfigure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install_with_globals() {
        let cli = Cli::try_parse_from(["modsync", "install", "--force", "--json", "--dry-run"])
            .unwrap();
        assert!(cli.global.json);
        assert!(cli.global.dry_run);
        assert!(matches!(cli.command, Commands::Install { force: true }));
        assert!(cli.command.is_long_running());
    }

    #[test]
    fn test_select_requires_names() {
        assert!(Cli::try_parse_from(["modsync", "select"]).is_err());

        let cli = Cli::try_parse_from(["modsync", "select", "ui", "net"]).unwrap();
        match cli.command {
            Commands::Select { packages } => assert_eq!(packages, ["ui", "net"]),
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_color_flag() {
        let cli = Cli::try_parse_from(["modsync", "--color", "never", "ls"]).unwrap();
        assert_eq!(cli.global.color, Some(ColorChoice::Never));
        assert_eq!(cli.command.name(), "list");
    }
}
