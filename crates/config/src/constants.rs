//! Default values shared by the configuration and the install pipeline

/// Ticks a package may stay pending before it is timed out
pub const DEFAULT_POLL_BOUND: u32 = 100;

/// Delay between orchestrator ticks
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Base package that ships with the installer itself
pub const DEFAULT_ALWAYS_SKIP_PACKAGE: &str = "common";

pub const DEFAULT_REPO_ROOT: &str = "modsync_data/repos";
pub const DEFAULT_MANIFEST_FILE: &str = "modsync.json";
pub const DEFAULT_STATE_FILE: &str = "modsync_data/state.json";
pub const DEFAULT_ENVIRONMENT_FILE: &str = "system_environments.json";

/// Debug log files written by `--debug`, relative to the working directory
pub const LOGS_DIR: &str = "modsync_data/logs";
