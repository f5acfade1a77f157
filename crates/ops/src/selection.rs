//! Selection changes

use crate::OpsCtx;
use modsync_errors::{Error, OpsError, PackageError};
use modsync_events::{AppEvent, EventEmitter, SelectionEvent, StateEvent};

/// Select or deselect packages and persist the result
///
/// Toggles do not cascade to dependencies. Required packages cannot be
/// deselected; they are reported and left selected.
///
/// # Errors
///
/// Returns an error if no names are given, a name is unknown, or the store
/// fails.
pub async fn select(ctx: &OpsCtx, names: &[String], selected: bool) -> Result<Vec<String>, Error> {
    if names.is_empty() {
        return Err(OpsError::NoPackagesSpecified.into());
    }
    for name in names {
        if !ctx.graph.contains(name) {
            return Err(PackageError::NotFound { name: name.clone() }.into());
        }
    }

    let mut selection = ctx.current_selection().await?;
    for name in names {
        let required = ctx.graph.find_by_name(name).is_some_and(|p| p.required);
        if required && !selected {
            ctx.emit_warning_with_context(
                format!("{name} is required and stays selected"),
                "required packages are always installed",
            );
            continue;
        }
        if selection.set_selected(name, selected) {
            ctx.emit(AppEvent::Selection(SelectionEvent::Changed {
                package: name.clone(),
                selected,
            }));
        }
    }

    let ordered = selection.ordered_names(&ctx.graph);
    ctx.selection.save(&ordered).await?;
    ctx.emit(AppEvent::State(StateEvent::SelectionSaved {
        count: ordered.len(),
    }));
    Ok(ordered)
}
