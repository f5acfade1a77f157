//! modsync - select project modules and keep their repositories in sync
//!
//! This is the CLI application that drives every operation through the ops
//! crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use modsync_config::{constants, Config};
use modsync_events::EventReceiver;
use modsync_ops::{CancelToken, OperationResult, OpsContextBuilder, OpsCtx};
use modsync_types::{ColorChoice, OutputFormat};
use std::process;
use tokio::select;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting modsync v{}", env!("CARGO_PKG_VERSION"));

    // Precedence: defaults < file < environment < CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);
    config.validate()?;

    let json_output =
        cli.global.json || config.general.default_output == OutputFormat::Json;
    let renderer = OutputRenderer::new(json_output, config.general.color);

    // Configuration commands do not need a manifest
    if let Commands::Config {
        command: ConfigCommands::Show,
    } = cli.command
    {
        let result = OperationResult::Success(config.to_toml_string()?);
        renderer.render_result(&result)?;
        return Ok(());
    }

    let manifest = modsync_ops::load_manifest(&config.manifest_path()).await?;

    let (event_sender, event_receiver) = modsync_events::channel();

    let ops_ctx = OpsContextBuilder::new()
        .with_manifest(manifest)
        .with_event_sender(event_sender)
        .with_config(config.clone())
        .build()?;

    let colors_enabled = match config.general.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, json_output);

    let cancel = CancelToken::new();
    if cli.command.is_long_running() && !cli.global.dry_run {
        watch_ctrl_c(cancel.clone());
    }

    let command_name = cli.command.name();
    let result = execute_command_with_events(
        cli.command,
        cli.global.dry_run,
        &ops_ctx,
        cancel,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    if !result.is_success() {
        return Err(CliError::Incomplete(format!(
            "{command_name} finished with failures"
        )));
    }

    info!("Command completed successfully");
    Ok(())
}

/// Trip the cancel token on the first Ctrl-C
///
/// The current package still finishes; the batch stops before the next one.
fn watch_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current package");
            cancel.cancel();
        }
    });
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    dry_run: bool,
    ops_ctx: &OpsCtx,
    cancel: CancelToken,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, dry_run, ops_ctx, cancel));

    loop {
        select! {
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    dry_run: bool,
    ctx: &OpsCtx,
    cancel: CancelToken,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::List { filter } => {
            let rows = modsync_ops::list_packages(ctx, filter.as_deref()).await?;
            Ok(OperationResult::PackageList(rows))
        }

        Commands::Select { packages } => {
            let selection = modsync_ops::select(ctx, &packages, true).await?;
            Ok(OperationResult::Selection(selection))
        }

        Commands::Deselect { packages } => {
            let selection = modsync_ops::select(ctx, &packages, false).await?;
            Ok(OperationResult::Selection(selection))
        }

        Commands::Install { .. } | Commands::Reconfigure if dry_run => {
            let plan = modsync_ops::plan(ctx).await?;
            Ok(OperationResult::Plan(plan))
        }

        Commands::Install { force } => {
            let report = modsync_ops::install(ctx, force, cancel).await?;
            Ok(OperationResult::InstallReport(report))
        }

        Commands::Reconfigure => {
            let report = modsync_ops::reconfigure(ctx, cancel).await?;
            Ok(OperationResult::InstallReport(report))
        }

        Commands::Reset => {
            let report = modsync_ops::reset(ctx).await?;
            Ok(OperationResult::Reset(report))
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => Ok(OperationResult::Success(ctx.config.to_toml_string()?)),
        },
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_dir = std::path::Path::new(constants::LOGS_DIR);
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }

        let log_file = log_dir.join(format!(
            "modsync-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| {
                                tracing_subscriber::EnvFilter::new(
                                    "info,modsync=debug,modsync_ops=debug,modsync_install=debug",
                                )
                            },
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // JSON mode: suppress console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,modsync=warn,modsync_ops=warn")
                }),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.json {
        config.general.default_output = OutputFormat::Json;
    }
    if let Some(root) = &global.project_root {
        config.paths.project_root = Some(root.clone());
    }
    if let Some(manifest) = &global.manifest {
        config.paths.manifest_path = Some(manifest.clone());
    }
}
