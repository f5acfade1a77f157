use serde::{Deserialize, Serialize};

/// Persisted state events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    SelectionSaved { count: usize },

    /// The installation-complete flag was set
    CompletionMarked,

    /// Selection and completion flag were cleared
    Reset,
}
