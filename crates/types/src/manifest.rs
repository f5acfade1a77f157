//! Manifest model: packages plus the project path variables

use crate::Package;
use serde::{Deserialize, Serialize};

/// A project directory variable such as `AOT_LIBRARY_PATH`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPath {
    pub name: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub required: bool,
}

impl SystemPath {
    /// Value used when nothing has been configured: the default for
    /// required paths, empty otherwise
    #[must_use]
    pub fn initial_value(&self) -> &str {
        if self.required {
            &self.default_value
        } else {
            ""
        }
    }
}

/// Key/value pair written to the environment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub key: String,
    pub value: String,
}

/// Parsed manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub system_paths: Vec<SystemPath>,
}

impl Manifest {
    /// Parse a manifest from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid manifest document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Default variables derived from the system paths
    #[must_use]
    pub fn default_variables(&self) -> Vec<EnvironmentVariable> {
        self.system_paths
            .iter()
            .map(|path| EnvironmentVariable {
                key: path.name.clone(),
                value: path.initial_value().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_path_starts_empty() {
        let manifest = Manifest {
            packages: Vec::new(),
            system_paths: vec![
                SystemPath {
                    name: "AOT_LIBRARY_PATH".into(),
                    default_value: "Assets/Aot".into(),
                    required: true,
                },
                SystemPath {
                    name: "CONFIG_PATH".into(),
                    default_value: "Assets/Config".into(),
                    required: false,
                },
            ],
        };
        let vars = manifest.default_variables();
        assert_eq!(vars[0].value, "Assets/Aot");
        assert_eq!(vars[1].value, "");
    }
}
