//! Report type definitions for operations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal or intermediate state of an install batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Processing,
    Done,
    Cancelled,
}

impl BatchState {
    /// Whether the batch will make no further progress
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Outcome recorded for one package in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageOutcome {
    Completed,
    Skipped,
    NotFound,
    Failed { reason: String },
    TimedOut { ticks: u32 },
    Cancelled,
}

impl PackageOutcome {
    /// Whether the package ended up installed or intentionally skipped
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

impl fmt::Display for PackageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Skipped => f.write_str("skipped"),
            Self::NotFound => f.write_str("not found"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::TimedOut { ticks } => write!(f, "timed out after {ticks} ticks"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Per-package line of an install report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReport {
    pub name: String,
    pub outcome: PackageOutcome,
}

/// Outcome of one post-install handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerReport {
    pub name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Installation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    /// Outcomes in processing order
    pub packages: Vec<PackageReport>,
    /// Packages removed before installing, for reconfiguration runs
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub handlers: Vec<HandlerReport>,
    pub state: BatchState,
    /// Total execution time
    pub duration_ms: u64,
}

impl InstallReport {
    /// Empty report in the given state
    #[must_use]
    pub fn empty(state: BatchState) -> Self {
        Self {
            packages: Vec::new(),
            removed: Vec::new(),
            handlers: Vec::new(),
            state,
            duration_ms: 0,
        }
    }

    /// Outcome for a package, if it was part of the batch
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&PackageOutcome> {
        self.packages
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.outcome)
    }

    /// Number of packages that did not succeed
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.packages
            .iter()
            .filter(|p| !p.outcome.is_success())
            .count()
    }
}

/// What a reset undid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetReport {
    /// Checkouts deleted from the repo root
    pub removed: Vec<String>,
    /// Uninstall stage of each handler
    pub handlers: Vec<HandlerReport>,
}

impl ResetReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.handlers.iter().all(|h| h.success)
    }
}

