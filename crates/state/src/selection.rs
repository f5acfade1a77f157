//! Typed view over the store: selected names and the completion flag

use crate::KeyValueStore;
use modsync_errors::{Error, StateError};
use serde_json::Value;
use std::sync::Arc;

/// Key holding the list of selected package names
pub const SELECTED_PACKAGES_KEY: &str = "modsync.selected_packages";

/// Key holding the packages present on disk after the last run
pub const INSTALLED_PACKAGES_KEY: &str = "modsync.installed_packages";

/// Key holding the installation-complete flag
pub const INSTALL_COMPLETE_KEY: &str = "modsync.install_complete";

/// Durable selection, read once at startup and written on every change
#[derive(Clone)]
pub struct PersistedSelection {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PersistedSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSelection").finish_non_exhaustive()
    }
}

impl PersistedSelection {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the persisted names
    ///
    /// A missing entry reads as an empty list. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the entry is not a list of
    /// strings.
    pub async fn load(&self) -> Result<Vec<String>, Error> {
        match self.store.get(SELECTED_PACKAGES_KEY).await? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                StateError::InvalidValue {
                    key: SELECTED_PACKAGES_KEY.to_string(),
                    message: e.to_string(),
                }
                .into()
            }),
            None => {
                tracing::debug!("no persisted selection");
                Ok(Vec::new())
            }
        }
    }

    /// Replace the persisted names
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn save<S: AsRef<str>>(&self, names: &[S]) -> Result<(), Error> {
        let list = names
            .iter()
            .map(|n| Value::String(n.as_ref().to_string()))
            .collect();
        self.store
            .set(SELECTED_PACKAGES_KEY, Value::Array(list))
            .await
    }

    /// Packages recorded as installed by the last run, if any run finished
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the entry is not a list of
    /// strings.
    pub async fn load_installed(&self) -> Result<Option<Vec<String>>, Error> {
        self.store
            .get(INSTALLED_PACKAGES_KEY)
            .await?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    StateError::InvalidValue {
                        key: INSTALLED_PACKAGES_KEY.to_string(),
                        message: e.to_string(),
                    }
                    .into()
                })
            })
            .transpose()
    }

    /// Replace the installed package list
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn save_installed<S: AsRef<str>>(&self, names: &[S]) -> Result<(), Error> {
        let list = names
            .iter()
            .map(|n| Value::String(n.as_ref().to_string()))
            .collect();
        self.store
            .set(INSTALLED_PACKAGES_KEY, Value::Array(list))
            .await
    }

    /// Whether a first-time install has finished
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn is_install_complete(&self) -> Result<bool, Error> {
        Ok(matches!(
            self.store.get(INSTALL_COMPLETE_KEY).await?,
            Some(Value::Bool(true))
        ))
    }

    /// Record that the first-time install finished
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn mark_install_complete(&self) -> Result<(), Error> {
        self.store.set(INSTALL_COMPLETE_KEY, Value::Bool(true)).await
    }

    /// Clear the selection, the installed list and the completion flag
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn reset(&self) -> Result<(), Error> {
        self.store.remove(SELECTED_PACKAGES_KEY).await?;
        self.store.remove(INSTALLED_PACKAGES_KEY).await?;
        self.store.remove(INSTALL_COMPLETE_KEY).await
    }
}
