//! Post-install module handlers

use modsync_errors::Error;
use modsync_events::{AppEvent, EventEmitter, EventSender, FailureContext, InstallEvent};
use modsync_types::SystemPath;
use std::path::PathBuf;

/// Everything a handler may need about the project being configured
#[derive(Clone, Debug, Default)]
pub struct HandlerContext {
    pub project_root: PathBuf,
    pub environment_file: PathBuf,
    pub system_paths: Vec<SystemPath>,
    /// Packages selected for this run, in install order
    pub selected: Vec<String>,
    pub event_sender: Option<EventSender>,
}

impl EventEmitter for HandlerContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

/// A named post-install stage
#[async_trait::async_trait]
pub trait ModuleHandler: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Returns an error if the stage fails; other handlers still run.
    async fn install(&self, ctx: &HandlerContext) -> Result<(), Error>;

    /// # Errors
    ///
    /// Returns an error if the stage cannot be undone.
    async fn uninstall(&self, ctx: &HandlerContext) -> Result<(), Error> {
        let _ = ctx;
        Ok(())
    }
}

/// Result of one handler invocation
#[derive(Clone, Debug)]
pub struct HandlerOutcome {
    pub handler: String,
    pub result: Result<(), Error>,
}

impl HandlerOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Handlers registered by name, run in registration order
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn ModuleHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any handler with the same name
    pub fn register(&mut self, handler: Box<dyn ModuleHandler>) {
        if let Some(slot) = self.handlers.iter_mut().find(|h| h.name() == handler.name()) {
            *slot = handler;
        } else {
            self.handlers.push(handler);
        }
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler's install stage
    pub async fn install_all(&self, ctx: &HandlerContext) -> Vec<HandlerOutcome> {
        let mut outcomes = Vec::with_capacity(self.handlers.len());
        for handler in &self.handlers {
            let result = handler.install(ctx).await;
            outcomes.push(Self::settle(ctx, handler.name(), result));
        }
        outcomes
    }

    /// Run every handler's uninstall stage
    pub async fn uninstall_all(&self, ctx: &HandlerContext) -> Vec<HandlerOutcome> {
        let mut outcomes = Vec::with_capacity(self.handlers.len());
        for handler in &self.handlers {
            let result = handler.uninstall(ctx).await;
            outcomes.push(Self::settle(ctx, handler.name(), result));
        }
        outcomes
    }

    fn settle(ctx: &HandlerContext, name: &str, result: Result<(), Error>) -> HandlerOutcome {
        match &result {
            Ok(()) => ctx.emit(AppEvent::Install(InstallEvent::HandlerCompleted {
                handler: name.to_string(),
            })),
            Err(e) => {
                tracing::warn!(handler = name, error = %e, "module handler failed");
                ctx.emit(AppEvent::Install(InstallEvent::HandlerFailed {
                    handler: name.to_string(),
                    failure: FailureContext::from_error(e),
                }));
            }
        }
        HandlerOutcome {
            handler: name.to_string(),
            result,
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
