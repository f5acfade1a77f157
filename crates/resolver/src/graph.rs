//! Package graph keyed by name

use modsync_errors::{Error, PackageError};
use modsync_types::{is_plain_name, Package};
use std::collections::{HashMap, HashSet};

/// Ordered package collection with name lookup
#[derive(Clone, Debug, Default)]
pub struct PackageGraph {
    packages: Vec<Package>,
    index: HashMap<String, usize>,
}

impl PackageGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a package list
    ///
    /// # Errors
    ///
    /// See [`PackageGraph::load`].
    pub fn from_packages(packages: Vec<Package>) -> Result<Self, Error> {
        let mut graph = Self::new();
        graph.load(packages)?;
        Ok(graph)
    }

    /// Replace the package list entirely
    ///
    /// The previous contents are kept if the new list is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, two packages share a name, or
    /// a name is not a single path component (checkouts live at
    /// `<repo root>/<name>`).
    pub fn load(&mut self, packages: Vec<Package>) -> Result<(), Error> {
        if packages.is_empty() {
            return Err(PackageError::EmptyManifest.into());
        }

        let mut index = HashMap::with_capacity(packages.len());
        for (position, package) in packages.iter().enumerate() {
            if !is_plain_name(&package.name) {
                return Err(PackageError::InvalidName {
                    name: package.name.clone(),
                }
                .into());
            }
            if index.insert(package.name.clone(), position).is_some() {
                return Err(PackageError::DuplicatePackage {
                    name: package.name.clone(),
                }
                .into());
            }
        }

        self.packages = packages;
        self.index = index;
        Ok(())
    }

    /// Exact, case-sensitive lookup
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Package> {
        self.index.get(name).map(|&i| &self.packages[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Packages in manifest order
    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Required packages in manifest order
    pub fn required(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| p.required)
    }

    /// Every package transitively required by `name`
    ///
    /// Direct dependencies come first, followed by the expansion of each one
    /// in turn; repeats are dropped keeping the first occurrence. A
    /// dependency that names an unknown package is listed but not expanded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `name` is not in the graph and
    /// `CyclicDependency` if the expansion reaches a package already on the
    /// current path.
    pub fn recursive_dependencies(&self, name: &str) -> Result<Vec<String>, Error> {
        if !self.contains(name) {
            return Err(PackageError::NotFound {
                name: name.to_string(),
            }
            .into());
        }

        let mut listed = Vec::new();
        let mut expanded = HashSet::new();
        let mut path = vec![name.to_string()];
        self.expand(name, &mut path, &mut expanded, &mut listed)?;

        let mut seen = HashSet::new();
        listed.retain(|dep| seen.insert(dep.clone()));
        Ok(listed)
    }

    fn expand(
        &self,
        name: &str,
        path: &mut Vec<String>,
        expanded: &mut HashSet<String>,
        listed: &mut Vec<String>,
    ) -> Result<(), Error> {
        let Some(package) = self.find_by_name(name) else {
            return Ok(());
        };
        expanded.insert(name.to_string());
        listed.extend(package.dependencies.iter().cloned());

        for dep in &package.dependencies {
            if let Some(start) = path.iter().position(|p| p == dep) {
                let mut cycle: Vec<&str> = path[start..].iter().map(String::as_str).collect();
                cycle.push(dep);
                return Err(PackageError::CyclicDependency {
                    path: cycle.join(" -> "),
                }
                .into());
            }
            if !self.contains(dep) {
                tracing::warn!(package = %name, dependency = %dep, "dependency not in manifest");
                continue;
            }
            // An already expanded package only contributes names that are
            // listed earlier, so skipping it leaves the deduplicated order intact.
            if expanded.contains(dep) {
                continue;
            }
            path.push(dep.clone());
            self.expand(dep, path, expanded, listed)?;
            path.pop();
        }
        Ok(())
    }

    /// Check every package for dependency cycles
    ///
    /// # Errors
    ///
    /// Returns the first `CyclicDependency` found, in manifest order.
    pub fn validate(&self) -> Result<(), Error> {
        for package in &self.packages {
            self.recursive_dependencies(&package.name)?;
        }
        Ok(())
    }

    /// Filter `names` into manifest order, dropping unknown names
    #[must_use]
    pub fn ordered<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let wanted: HashSet<&str> = names.into_iter().map(String::as_str).collect();
        self.packages
            .iter()
            .filter(|p| wanted.contains(p.name.as_str()))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Packages whose name, display name or description contains `query`
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&Package> {
        self.packages.iter().filter(|p| p.matches(query)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, deps: &[&str]) -> Package {
        Package::new(name).with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = PackageGraph::from_packages(vec![pkg("a", &[]), pkg("a", &[])]);
        assert!(matches!(
            result,
            Err(Error::Package(PackageError::DuplicatePackage { ref name })) if name == "a"
        ));
    }

    #[test]
    fn test_names_escaping_repo_root_rejected() {
        for bad in ["../../escaped", "nested/ui", "/abs", ".."] {
            let result = PackageGraph::from_packages(vec![pkg("a", &[]), pkg(bad, &[])]);
            match result {
                Err(err @ Error::Package(PackageError::InvalidName { .. })) => {
                    assert!(err.is_configuration_error());
                }
                other => panic!("{bad}: expected invalid name, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_failed_load_keeps_previous_list() {
        let mut graph = PackageGraph::from_packages(vec![pkg("a", &[])]).unwrap();
        assert!(graph.load(Vec::new()).is_err());
        assert!(graph.find_by_name("a").is_some());
    }

    #[test]
    fn test_direct_dependencies_listed_before_expansion() {
        let graph = PackageGraph::from_packages(vec![
            pkg("app", &["ui", "net"]),
            pkg("ui", &["render"]),
            pkg("net", &["socket"]),
            pkg("render", &[]),
            pkg("socket", &[]),
        ])
        .unwrap();
        assert_eq!(
            graph.recursive_dependencies("app").unwrap(),
            vec!["ui", "net", "render", "socket"]
        );
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let graph = PackageGraph::from_packages(vec![
            pkg("top", &["left", "right"]),
            pkg("left", &["base"]),
            pkg("right", &["base"]),
            pkg("base", &[]),
        ])
        .unwrap();
        assert_eq!(
            graph.recursive_dependencies("top").unwrap(),
            vec!["left", "right", "base"]
        );
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_cycle_reports_path() {
        let graph =
            PackageGraph::from_packages(vec![pkg("a", &["b"]), pkg("b", &["c"]), pkg("c", &["b"])])
                .unwrap();
        let err = graph.recursive_dependencies("a").unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::CyclicDependency { ref path }) if path == "b -> c -> b"
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let graph = PackageGraph::from_packages(vec![pkg("a", &["a"])]).unwrap();
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_unknown_dependency_listed_not_expanded() {
        let graph = PackageGraph::from_packages(vec![pkg("a", &["ghost", "b"]), pkg("b", &[])])
            .unwrap();
        assert_eq!(graph.recursive_dependencies("a").unwrap(), vec!["ghost", "b"]);
    }

    #[test]
    fn test_ordered_follows_manifest() {
        let graph =
            PackageGraph::from_packages(vec![pkg("x", &[]), pkg("y", &[]), pkg("z", &[])]).unwrap();
        let names = ["z".to_string(), "x".to_string(), "missing".to_string()];
        assert_eq!(graph.ordered(names.iter()), vec!["x", "z"]);
    }
}
