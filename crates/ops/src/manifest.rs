//! Manifest file loading

use modsync_errors::{ConfigError, Error};
use modsync_types::Manifest;
use std::path::Path;

/// Read and parse a JSON manifest
///
/// # Errors
///
/// Returns an error if the file is missing or is not a valid manifest.
pub async fn load_manifest(path: &Path) -> Result<Manifest, Error> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|_| ConfigError::ManifestNotFound {
            path: path.display().to_string(),
        })?;
    Manifest::from_json(&contents).map_err(|e| {
        ConfigError::ManifestParse {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
