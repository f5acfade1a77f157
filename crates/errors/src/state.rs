//! Persisted state error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("failed to read state store {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("failed to write state store {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("state corrupted: {message}")]
    StateCorrupted { message: String },

    #[error("unexpected value under key {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::StateCorrupted { .. } | Self::InvalidValue { .. } => {
                Some("Run `modsync reset` to clear the stored selection.")
            }
            Self::WriteFailed { .. } => Some("Ensure the state directory is writable."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ReadFailed { .. } | Self::WriteFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ReadFailed { .. } => "state.read_failed",
            Self::WriteFailed { .. } => "state.write_failed",
            Self::StateCorrupted { .. } => "state.corrupted",
            Self::InvalidValue { .. } => "state.invalid_value",
        };
        Some(code)
    }
}
