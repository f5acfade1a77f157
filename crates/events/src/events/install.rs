use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Install batch and per-package lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    /// The orchestrator left `Idle`
    BatchStarted { total: usize },

    /// A package is about to be processed (1-based `current`)
    PackageProgress {
        current: usize,
        total: usize,
        package: String,
    },

    /// Repository sync was invoked for a package
    SyncStarted {
        package: String,
        destination: PathBuf,
    },

    /// Nothing to sync (no repository url, dry run)
    SyncSkipped { package: String, reason: String },

    /// The always-skip package was passed over
    PackageSkipped { package: String },

    /// The package is not in the graph
    PackageNotFound { package: String },

    PackageCompleted { package: String },

    PackageFailed {
        package: String,
        failure: FailureContext,
    },

    /// No completion arrived within the poll bound
    PackageTimedOut { package: String, ticks: u32 },

    /// A checkout was deleted during reconfiguration
    PackageRemoved { package: String },

    /// Every package reached a terminal outcome
    BatchCompleted {
        completed: usize,
        skipped: usize,
        failed: usize,
    },

    /// The batch stopped before processing `remaining` packages
    BatchCancelled { remaining: usize },

    HandlerCompleted { handler: String },

    HandlerFailed {
        handler: String,
        failure: FailureContext,
    },
}
