use serde::{Deserialize, Serialize};

/// Selection computation events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SelectionEvent {
    /// Selection built from required packages and their closures
    Initialized { selected: usize },

    /// Persisted names were merged into the selection
    PersistedMerged { added: usize },

    /// A persisted name no longer exists in the manifest
    UnknownPersisted { package: String },

    /// A package was toggled directly
    Changed { package: String, selected: bool },

    DiffComputed {
        to_remove: Vec<String>,
        to_install: Vec<String>,
    },
}
