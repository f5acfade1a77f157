//! Package listing

use crate::OpsCtx;
use modsync_errors::Error;
use modsync_types::PackageRow;

/// List packages with their selection state
///
/// `filter` matches name, display name and description case-insensitively.
///
/// # Errors
///
/// Returns an error if the selection cannot be computed.
pub async fn list_packages(ctx: &OpsCtx, filter: Option<&str>) -> Result<Vec<PackageRow>, Error> {
    let selection = ctx.current_selection().await?;
    let packages = match filter {
        Some(query) if !query.trim().is_empty() => ctx.graph.filter(query.trim()),
        _ => ctx.graph.packages().iter().collect(),
    };
    Ok(packages
        .into_iter()
        .map(|p| PackageRow::from_package(p, selection.contains(&p.name)))
        .collect())
}
