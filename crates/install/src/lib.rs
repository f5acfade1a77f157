#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Sequential module installation for modsync
//!
//! The [`InstallOrchestrator`] walks an ordered package list one tick at a
//! time. Each package is handed to a [`RepositorySync`] implementation and
//! the orchestrator only advances once that package completes, fails or
//! runs out of ticks. After the batch, registered [`ModuleHandler`]s run
//! post-install stages such as [`EnvironmentHandler`].

mod cancel;
mod environment;
mod git;
mod handlers;
mod orchestrator;
mod sync;

pub use cancel::CancelToken;
pub use environment::{EnvironmentFile, EnvironmentHandler};
pub use git::GitSync;
pub use handlers::{HandlerContext, HandlerOutcome, HandlerRegistry, ModuleHandler};
pub use orchestrator::{InstallOrchestrator, JobState, DEFAULT_POLL_BOUND};
pub use sync::{NoopSync, RepositorySync, SyncCompletion, SyncResult};

// Re-export EventSender for implementors of the sync and handler traits
pub use modsync_events::EventSender;
