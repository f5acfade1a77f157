//! State maintenance

use crate::install::{handler_reports, remove_packages};
use crate::OpsCtx;
use modsync_errors::Error;
use modsync_events::{AppEvent, EventEmitter, FailureContext, StateEvent};
use modsync_types::ResetReport;
use std::collections::BTreeSet;

/// Undo the installation and clear the persisted state
///
/// Deletes the checkout of every selected or installed package (the
/// always-skip package is never synced, so it is left alone), runs each
/// handler's uninstall stage, then clears the selection, the installed list
/// and the completion flag. Removal and handler failures are reported and do
/// not stop the reset.
///
/// # Errors
///
/// Returns an error if the store cannot be cleared.
pub async fn reset(ctx: &OpsCtx) -> Result<ResetReport, Error> {
    ctx.emit_operation_started("reset");

    let result = run_reset(ctx).await;
    match &result {
        Ok(report) => ctx.emit_operation_completed("reset", report.is_success()),
        Err(e) => ctx.emit_operation_failed("reset", FailureContext::from_error(e)),
    }
    result
}

async fn run_reset(ctx: &OpsCtx) -> Result<ResetReport, Error> {
    let mut names: BTreeSet<String> = known_names(ctx).await.into_iter().collect();
    names.remove(&ctx.config.install.always_skip_package);

    if !names.is_empty() {
        ctx.emit_step("removing package checkouts");
    }
    let removed = remove_packages(ctx, &names).await;

    ctx.emit_step("uninstalling module handlers");
    let ordered = ctx.graph.ordered(names.iter());
    let handler_ctx = ctx.handler_context(ordered);
    let handlers = handler_reports(ctx.handlers.uninstall_all(&handler_ctx).await);

    ctx.selection.reset().await?;
    ctx.emit(AppEvent::State(StateEvent::Reset));

    Ok(ResetReport { removed, handlers })
}

/// Selected and installed names; unreadable entries count as empty
async fn known_names(ctx: &OpsCtx) -> Vec<String> {
    let mut names = ctx.selection.load().await.unwrap_or_else(|e| {
        ctx.emit_warning_with_context("ignoring unreadable selection", e.to_string());
        Vec::new()
    });
    match ctx.selection.load_installed().await {
        Ok(installed) => names.extend(installed.unwrap_or_default()),
        Err(e) => {
            ctx.emit_warning_with_context("ignoring unreadable installed list", e.to_string());
        }
    }
    names
}
