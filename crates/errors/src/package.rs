//! Package graph error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    #[error("package not found: {name}")]
    NotFound { name: String },

    #[error("manifest contains no packages")]
    EmptyManifest,

    #[error("duplicate package name in manifest: {name}")]
    DuplicatePackage { name: String },

    #[error("invalid package name in manifest: {name:?}")]
    InvalidName { name: String },

    #[error("dependency cycle detected: {path}")]
    CyclicDependency { path: String },
}

impl PackageError {
    /// Whether this error comes from a broken manifest rather than a lookup
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Run `modsync list` to see the known packages."),
            Self::EmptyManifest => Some("Add at least one package to the manifest."),
            Self::DuplicatePackage { .. } => Some("Package names must be unique in the manifest."),
            Self::InvalidName { .. } => {
                Some("Package names must be a single directory name without separators.")
            }
            Self::CyclicDependency { .. } => {
                Some("Break the dependency cycle in the manifest and retry.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "package.not_found",
            Self::EmptyManifest => "package.empty_manifest",
            Self::DuplicatePackage { .. } => "package.duplicate",
            Self::InvalidName { .. } => "package.invalid_name",
            Self::CyclicDependency { .. } => "package.cyclic_dependency",
        };
        Some(code)
    }
}
