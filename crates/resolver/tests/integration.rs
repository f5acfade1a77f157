//! Integration tests for resolver crate

#[cfg(test)]
mod tests {
    use modsync_errors::{Error, PackageError};
    use modsync_resolver::*;
    use modsync_types::Package;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn sample_graph() -> PackageGraph {
        PackageGraph::from_packages(vec![
            Package::new("common").with_required(true),
            Package::new("core")
                .with_required(true)
                .with_dependencies(["common", "log"]),
            Package::new("log").with_dependencies(["common"]),
            Package::new("net")
                .with_dependencies(["log"])
                .with_description("Network transport"),
            Package::new("ui")
                .with_dependencies(["core", "render"])
                .with_git_url("https://example.com/ui.git"),
            Package::new("render"),
        ])
        .unwrap()
    }

    fn set(names: &[&str]) -> SelectionSet {
        SelectionSet::from_names(names.iter().copied())
    }

    #[test]
    fn test_required_closure_present_after_initialization() {
        let graph = sample_graph();
        let selection = SelectionSet::initialize_from_graph(&graph).unwrap();
        for package in graph.required() {
            assert!(selection.contains(&package.name));
            for dep in graph.recursive_dependencies(&package.name).unwrap() {
                assert!(selection.contains(&dep), "{dep} missing");
            }
        }
        assert!(!selection.contains("ui"));
    }

    #[test]
    fn test_initialization_is_idempotent() {
        let graph = sample_graph();
        let first = SelectionSet::initialize_from_graph(&graph).unwrap();
        let second = SelectionSet::initialize_from_graph(&graph).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_two_node_cycle_is_rejected() {
        let graph = PackageGraph::from_packages(vec![
            Package::new("a").with_required(true).with_dependencies(["b"]),
            Package::new("b").with_dependencies(["a"]),
        ])
        .unwrap();
        let err = SelectionSet::initialize_from_graph(&graph).unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::CyclicDependency { ref path }) if path == "a -> b -> a"
        ));
    }

    #[test]
    fn test_diff_of_overlapping_sets() {
        let diff = SelectionSet::diff(&set(&["a", "b"]), &set(&["b", "c"]));
        assert_eq!(diff.to_remove, BTreeSet::from(["a".to_string()]));
        assert_eq!(diff.to_install, BTreeSet::from(["c".to_string()]));
    }

    #[test]
    fn test_merging_unknown_names_changes_nothing() {
        let graph = sample_graph();
        let mut selection = SelectionSet::initialize_from_graph(&graph).unwrap();
        let before = selection.clone();
        let summary = selection.merge_with_persisted(&graph, ["gone", "also-gone"]);
        assert_eq!(selection, before);
        assert!(summary.added.is_empty());
        assert_eq!(summary.ignored.len(), 2);
    }

    #[test]
    fn test_empty_manifest_rejected() {
        assert!(matches!(
            PackageGraph::from_packages(Vec::new()),
            Err(Error::Package(PackageError::EmptyManifest))
        ));
    }

    #[test]
    fn test_filter_matches_description() {
        let graph = sample_graph();
        let hits: Vec<_> = graph.filter("TRANSPORT").iter().map(|p| p.name.clone()).collect();
        assert_eq!(hits, vec!["net"]);
    }

    fn name_set() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-f]", 0..6)
    }

    proptest! {
        #[test]
        fn prop_diff_partitions_symmetric_difference(old in name_set(), new in name_set()) {
            let old_sel = SelectionSet::from_names(old.iter().cloned());
            let new_sel = SelectionSet::from_names(new.iter().cloned());
            let diff = SelectionSet::diff(&old_sel, &new_sel);

            prop_assert!(diff.to_remove.is_disjoint(&diff.to_install));
            for name in &diff.to_remove {
                prop_assert!(old.contains(name) && !new.contains(name));
            }
            for name in &diff.to_install {
                prop_assert!(new.contains(name) && !old.contains(name));
            }
            // Applying the diff to the old selection yields the new one
            let applied: BTreeSet<String> = old
                .difference(&diff.to_remove)
                .cloned()
                .chain(diff.to_install.iter().cloned())
                .collect();
            prop_assert_eq!(applied, new);
        }

        #[test]
        fn prop_diff_with_self_is_empty(names in name_set()) {
            let sel = SelectionSet::from_names(names);
            prop_assert!(SelectionSet::diff(&sel, &sel).is_empty());
        }

        #[test]
        fn prop_merge_never_drops_selected(persisted in prop::collection::vec("[a-z]{1,6}", 0..8)) {
            let graph = sample_graph();
            let mut selection = SelectionSet::initialize_from_graph(&graph).unwrap();
            let before = selection.clone();
            selection.merge_with_persisted(&graph, &persisted);
            prop_assert!(before.names().is_subset(selection.names()));
            for name in selection.names() {
                prop_assert!(graph.contains(name));
            }
        }
    }
}
