#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package selection for modsync
//!
//! [`PackageGraph`] holds the manifest's packages keyed by name and expands
//! dependency closures. [`SelectionSet`] tracks which packages are marked for
//! installation, and [`SelectionDiff`] compares two selections to decide what
//! to remove and what to install.

mod graph;
mod selection;

pub use graph::PackageGraph;
pub use selection::{MergeSummary, SelectionDiff, SelectionSet};
