#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for modsync
//!
//! This crate sits between the CLI and the specialized crates. Every
//! operation takes an explicit [`OpsCtx`] holding the package graph, the
//! persisted selection, the event sender and the configuration.

mod context;
mod install;
mod maintenance;
mod manifest;
mod query;
mod selection;
mod types;

pub use context::{OpsContextBuilder, OpsCtx, SyncFactory};
pub use types::{InstallPlan, OperationResult};

// Re-export operation functions
pub use install::{install, plan, reconfigure};
pub use maintenance::reset;
pub use manifest::load_manifest;
pub use query::list_packages;
pub use selection::select;

// Re-exported so callers can build a cancellation token without a direct
// dependency on the install crate
pub use modsync_install::CancelToken;
