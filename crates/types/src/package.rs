//! Package-related type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// A selectable module from the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Unique key
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Always part of the initial selection
    #[serde(default)]
    pub required: bool,
    /// Direct dependencies by name, in manifest order
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, alias = "git_repository_url")]
    pub git_url: Option<String>,
}

impl Package {
    /// Create a package with no dependencies
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: None,
            required: false,
            dependencies: Vec::new(),
            git_url: None,
        }
    }

    /// Mark the package as required
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Add direct dependencies
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Set the repository URL
    #[must_use]
    pub fn with_git_url(mut self, url: impl Into<String>) -> Self {
        self.git_url = Some(url.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name shown to users, falling back to the key
    #[must_use]
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Whether the package has a repository to sync
    #[must_use]
    pub fn has_repository(&self) -> bool {
        self.git_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    /// Case-insensitive match against name, display name and description
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.display_name.to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Whether `name` is usable as a checkout directory name
///
/// Only a single normal path component qualifies: no separators, no `.` or
/// `..`, no root or drive prefix.
#[must_use]
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Listing row combining a package with its selection state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRow {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub required: bool,
    pub selected: bool,
    pub dependencies: Vec<String>,
    pub has_repository: bool,
}

impl PackageRow {
    /// Build a row from a package and its selection flag
    #[must_use]
    pub fn from_package(package: &Package, selected: bool) -> Self {
        Self {
            name: package.name.clone(),
            display_name: package.label().to_string(),
            description: package.description.clone(),
            required: package.required,
            selected,
            dependencies: package.dependencies.clone(),
            has_repository: package.has_repository(),
        }
    }
}
