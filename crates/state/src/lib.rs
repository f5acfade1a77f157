#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Persisted state for modsync
//!
//! A small key/value store holding JSON values, plus the typed
//! [`PersistedSelection`] view used by the install pipeline: the list of
//! selected package names and the installation-complete flag.

mod selection;
mod store;

pub use selection::{
    PersistedSelection, INSTALLED_PACKAGES_KEY, INSTALL_COMPLETE_KEY, SELECTED_PACKAGES_KEY,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
