//! Installation system error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("repository sync failed for {package}: {message}")]
    SyncFailed { package: String, message: String },

    #[error("git {command} failed in {path}: {message}")]
    GitFailed {
        command: String,
        path: String,
        message: String,
    },

    #[error("failed to remove {path}: {message}")]
    RemoveFailed { path: String, message: String },

    #[error("module handler {handler} failed: {message}")]
    HandlerFailed { handler: String, message: String },

    #[error("installation already completed; use --force to run it again")]
    AlreadyInstalled,

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::GitFailed { .. } | Self::SyncFailed { .. } => {
                Some("Check that git is installed and the repository is reachable.")
            }
            Self::RemoveFailed { .. } => {
                Some("Close programs holding files in the checkout and retry.")
            }
            Self::AlreadyInstalled => Some("Run `modsync reset` or pass --force."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SyncFailed { .. } | Self::GitFailed { .. } | Self::RemoveFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::SyncFailed { .. } => "install.sync_failed",
            Self::GitFailed { .. } => "install.git_failed",
            Self::RemoveFailed { .. } => "install.remove_failed",
            Self::HandlerFailed { .. } => "install.handler_failed",
            Self::AlreadyInstalled => "install.already_installed",
            Self::FilesystemError { .. } => "install.filesystem",
        };
        Some(code)
    }
}
