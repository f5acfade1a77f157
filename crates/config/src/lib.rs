#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for modsync
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/modsync/config.toml)
//! - Environment variables (`MODSYNC_*`)
//! - CLI flags (applied by the binary)

pub mod constants;

use modsync_errors::{ConfigError, Error};
use modsync_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Install pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Ticks a package may stay pending before it is timed out
    #[serde(default = "default_poll_bound")]
    pub poll_bound: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Package treated as already present and never synced
    #[serde(default = "default_always_skip_package")]
    pub always_skip_package: String,
    /// Checkout directory, relative to the project root unless absolute
    #[serde(default = "default_repo_root")]
    pub repo_root: PathBuf,
    #[serde(default = "default_git_remote")]
    pub git_remote: String,
    #[serde(default = "default_git_branch")]
    pub git_branch: String,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub project_root: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub environment_file: Option<PathBuf>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            poll_bound: default_poll_bound(),
            tick_interval_ms: default_tick_interval_ms(),
            always_skip_package: default_always_skip_package(),
            repo_root: default_repo_root(),
            git_remote: default_git_remote(),
            git_branch: default_git_branch(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_poll_bound() -> u32 {
    constants::DEFAULT_POLL_BOUND
}

fn default_tick_interval_ms() -> u64 {
    constants::DEFAULT_TICK_INTERVAL_MS
}

fn default_always_skip_package() -> String {
    constants::DEFAULT_ALWAYS_SKIP_PACKAGE.to_string()
}

fn default_repo_root() -> PathBuf {
    PathBuf::from(constants::DEFAULT_REPO_ROOT)
}

fn default_git_remote() -> String {
    "origin".to_string()
}

fn default_git_branch() -> String {
    "main".to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("modsync").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // MODSYNC_OUTPUT
        if let Ok(output) = std::env::var("MODSYNC_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MODSYNC_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // MODSYNC_COLOR
        if let Ok(color) = std::env::var("MODSYNC_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MODSYNC_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // MODSYNC_POLL_BOUND
        if let Ok(bound) = std::env::var("MODSYNC_POLL_BOUND") {
            self.install.poll_bound = bound.parse().map_err(|_| ConfigError::InvalidValue {
                field: "MODSYNC_POLL_BOUND".to_string(),
                value: bound,
            })?;
        }

        // MODSYNC_TICK_INTERVAL_MS
        if let Ok(interval) = std::env::var("MODSYNC_TICK_INTERVAL_MS") {
            self.install.tick_interval_ms =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "MODSYNC_TICK_INTERVAL_MS".to_string(),
                    value: interval,
                })?;
        }

        if let Ok(package) = std::env::var("MODSYNC_ALWAYS_SKIP") {
            self.install.always_skip_package = package;
        }
        if let Ok(remote) = std::env::var("MODSYNC_GIT_REMOTE") {
            self.install.git_remote = remote;
        }
        if let Ok(branch) = std::env::var("MODSYNC_GIT_BRANCH") {
            self.install.git_branch = branch;
        }
        if let Ok(root) = std::env::var("MODSYNC_PROJECT_ROOT") {
            self.paths.project_root = Some(PathBuf::from(root));
        }
        if let Ok(manifest) = std::env::var("MODSYNC_MANIFEST") {
            self.paths.manifest_path = Some(PathBuf::from(manifest));
        }
        if let Ok(state) = std::env::var("MODSYNC_STATE_PATH") {
            self.paths.state_path = Some(PathBuf::from(state));
        }

        self.validate()
    }

    /// Check values that deserialize fine but cannot drive an install
    ///
    /// # Errors
    ///
    /// Returns an error if the poll bound or tick interval is zero, or the
    /// git remote or branch is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.install.poll_bound == 0 {
            return Err(ConfigError::InvalidValue {
                field: "install.poll_bound".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.install.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "install.tick_interval_ms".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        for (field, value) in [
            ("install.git_remote", &self.install.git_remote),
            ("install.git_branch", &self.install.git_branch),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::Invalid {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Get the project root (defaults to the current directory)
    #[must_use]
    pub fn project_root(&self) -> PathBuf {
        self.paths
            .project_root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Get the manifest path (with default)
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(
            self.paths.manifest_path.as_deref(),
            constants::DEFAULT_MANIFEST_FILE,
        )
    }

    /// Get the persisted state file path (with default)
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.resolve(self.paths.state_path.as_deref(), constants::DEFAULT_STATE_FILE)
    }

    /// Get the environment file path (with default)
    #[must_use]
    pub fn environment_file(&self) -> PathBuf {
        self.resolve(
            self.paths.environment_file.as_deref(),
            constants::DEFAULT_ENVIRONMENT_FILE,
        )
    }

    /// Get the checkout root
    #[must_use]
    pub fn repo_root(&self) -> PathBuf {
        self.resolve(Some(&self.install.repo_root), constants::DEFAULT_REPO_ROOT)
    }

    /// Tick interval as a duration
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.install.tick_interval_ms)
    }

    fn resolve(&self, configured: Option<&Path>, fallback: &str) -> PathBuf {
        let path = configured.unwrap_or_else(|| Path::new(fallback));
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root().join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.install.poll_bound, 100);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.install.git_remote, "origin");
        assert_eq!(config.install.git_branch, "main");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relative_paths_resolve_under_project_root() {
        let mut config = Config::default();
        config.paths.project_root = Some(PathBuf::from("/work/game"));
        config.paths.state_path = Some(PathBuf::from("/var/modsync/state.json"));
        assert_eq!(
            config.repo_root(),
            PathBuf::from("/work/game").join(constants::DEFAULT_REPO_ROOT)
        );
        assert_eq!(config.state_path(), PathBuf::from("/var/modsync/state.json"));
    }

    #[test]
    fn test_zero_poll_bound_rejected() {
        let mut config = Config::default();
        config.install.poll_bound = 0;
        assert!(config.validate().is_err());
    }
}
