//! Selection set and selection diffs

use crate::PackageGraph;
use modsync_errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Names of the packages marked for installation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    names: BTreeSet<String>,
}

/// Result of merging persisted names into a selection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Names that were not selected before the merge
    pub added: Vec<String>,
    /// Persisted names the graph no longer knows
    pub ignored: Vec<String>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection holding exactly `names`, without consulting a graph
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Every required package plus its dependency closure
    ///
    /// Dependency names that are not in the graph are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if a required package's closure contains a cycle.
    pub fn initialize_from_graph(graph: &PackageGraph) -> Result<Self, Error> {
        let mut selection = Self::new();
        for package in graph.required() {
            selection.names.insert(package.name.clone());
            for dep in graph.recursive_dependencies(&package.name)? {
                if graph.contains(&dep) {
                    selection.names.insert(dep);
                }
            }
        }
        Ok(selection)
    }

    /// Add persisted names that still exist in the graph
    ///
    /// Unknown names are logged and skipped; they never fail the merge.
    pub fn merge_with_persisted<I, S>(&mut self, graph: &PackageGraph, names: I) -> MergeSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = MergeSummary::default();
        for name in names {
            let name = name.as_ref();
            if !graph.contains(name) {
                tracing::warn!(package = %name, "persisted package not in manifest, ignoring");
                summary.ignored.push(name.to_string());
                continue;
            }
            if self.names.insert(name.to_string()) {
                summary.added.push(name.to_string());
            }
        }
        summary
    }

    /// Direct toggle; dependencies and dependents are left alone
    ///
    /// Returns whether the selection changed.
    pub fn set_selected(&mut self, name: &str, selected: bool) -> bool {
        if selected {
            self.names.insert(name.to_string())
        } else {
            self.names.remove(name)
        }
    }

    #[must_use]
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Selection in manifest order, used as the install list
    #[must_use]
    pub fn ordered_names(&self, graph: &PackageGraph) -> Vec<String> {
        graph.ordered(self.names.iter())
    }

    /// Compare two selections
    #[must_use]
    pub fn diff(old: &Self, new: &Self) -> SelectionDiff {
        SelectionDiff {
            to_remove: old.names.difference(&new.names).cloned().collect(),
            to_install: new.names.difference(&old.names).cloned().collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_names(iter)
    }
}

/// Packages to remove and to install when moving between selections
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDiff {
    pub to_remove: BTreeSet<String>,
    pub to_install: BTreeSet<String>,
}

impl SelectionDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_install.is_empty()
    }
}
