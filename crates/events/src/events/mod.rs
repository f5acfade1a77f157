use serde::{Deserialize, Serialize};

use crate::EventSource;
use modsync_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Failure with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            hint: None,
            retryable: false,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod install;
pub mod selection;
pub mod state;

pub use general::*;
pub use install::*;
pub use selection::*;
pub use state::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (log lines, step changes, operations)
    General(GeneralEvent),

    /// Selection computation and toggling
    Selection(SelectionEvent),

    /// Install batch and per-package lifecycle
    Install(InstallEvent),

    /// Persisted state changes
    State(StateEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Selection(_) => EventSource::SELECTION,
            Self::Install(_) => EventSource::INSTALL,
            Self::State(_) => EventSource::STATE,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Install(
                InstallEvent::PackageFailed { .. } | InstallEvent::HandlerFailed { .. },
            ) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Install(
                InstallEvent::PackageTimedOut { .. }
                | InstallEvent::PackageNotFound { .. }
                | InstallEvent::BatchCancelled { .. },
            )
            | Self::Selection(SelectionEvent::UnknownPersisted { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Install(InstallEvent::SyncSkipped { .. })
            | Self::Selection(SelectionEvent::DiffComputed { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Package named by a per-package install event
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::Install(
                InstallEvent::PackageProgress { package, .. }
                | InstallEvent::SyncStarted { package, .. }
                | InstallEvent::SyncSkipped { package, .. }
                | InstallEvent::PackageSkipped { package }
                | InstallEvent::PackageNotFound { package }
                | InstallEvent::PackageCompleted { package }
                | InstallEvent::PackageFailed { package, .. }
                | InstallEvent::PackageTimedOut { package, .. }
                | InstallEvent::PackageRemoved { package },
            ) => Some(package),
            _ => None,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "modsync::events::general",
            Self::Selection(_) => "modsync::events::selection",
            Self::Install(_) => "modsync::events::install",
            Self::State(_) => "modsync::events::state",
        }
    }
}
