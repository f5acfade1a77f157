//! Operation result types

use modsync_errors::{Error, OpsError};
use modsync_types::{InstallReport, PackageRow, ResetReport};
use serde::Serialize;

/// What an install or reconfigure run would do
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    /// Effective selection in manifest order
    pub selected: Vec<String>,
    /// Packages a run would sync, in order
    pub to_install: Vec<String>,
    /// Packages a reconfigure run would delete
    pub to_remove: Vec<String>,
    /// Whether the first-time install already finished
    pub install_complete: bool,
}

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Package list
    PackageList(Vec<PackageRow>),
    /// Selection after a change, in manifest order
    Selection(Vec<String>),
    /// Dry-run plan
    Plan(InstallPlan),
    /// Installation report
    InstallReport(InstallReport),
    /// What a reset removed
    Reset(ResetReport),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::InstallReport(report) => {
                report.failure_count() == 0 && report.handlers.iter().all(|h| h.success)
            }
            OperationResult::Reset(report) => report.is_success(),
            OperationResult::PackageList(_)
            | OperationResult::Selection(_)
            | OperationResult::Plan(_)
            | OperationResult::Success(_) => true,
        }
    }
}
