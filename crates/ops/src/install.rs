//! Install, reconfigure and dry-run planning

use crate::{InstallPlan, OpsCtx};
use modsync_errors::{Error, InstallError};
use modsync_events::{AppEvent, EventEmitter, FailureContext, SelectionEvent, StateEvent};
use modsync_install::{CancelToken, HandlerOutcome, InstallOrchestrator};
use modsync_resolver::SelectionSet;
use modsync_types::{is_plain_name, BatchState, HandlerReport, InstallReport};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Run the first-time install of the current selection
///
/// Every selected package is synced in manifest order, then the module
/// handlers run and the installation is marked complete. A cancelled batch
/// skips the handlers and leaves the completion flag untouched.
///
/// # Errors
///
/// Returns an error if the installation already completed and `force` is not
/// set, the selection cannot be computed, or the store fails.
pub async fn install(ctx: &OpsCtx, force: bool, cancel: CancelToken) -> Result<InstallReport, Error> {
    ctx.emit_operation_started("install");

    let result = run_install(ctx, force, cancel).await;
    finish_operation(ctx, "install", &result);
    result
}

/// Move the installation from the last installed set to the current selection
///
/// Deselected checkouts are removed first, then newly selected packages are
/// installed and the module handlers run again.
///
/// # Errors
///
/// Returns an error if the selection cannot be computed or the store fails.
/// Removal failures are reported as warnings and do not abort the run.
pub async fn reconfigure(ctx: &OpsCtx, cancel: CancelToken) -> Result<InstallReport, Error> {
    ctx.emit_operation_started("reconfigure");

    let result = run_reconfigure(ctx, cancel).await;
    finish_operation(ctx, "reconfigure", &result);
    result
}

/// Compute what the next install or reconfigure would do, without side effects
///
/// # Errors
///
/// Returns an error if the selection cannot be computed or the store fails.
pub async fn plan(ctx: &OpsCtx) -> Result<InstallPlan, Error> {
    let selection = ctx.current_selection().await?;
    let selected = selection.ordered_names(&ctx.graph);
    let install_complete = ctx.selection.is_install_complete().await?;

    let installed = if install_complete {
        ctx.selection.load_installed().await?
    } else {
        None
    };

    let (to_install, to_remove) = match installed {
        Some(names) => {
            let previous = SelectionSet::from_names(names);
            let diff = SelectionSet::diff(&previous, &selection);
            (
                ctx.graph.ordered(diff.to_install.iter()),
                diff.to_remove.into_iter().collect(),
            )
        }
        None => (selected.clone(), Vec::new()),
    };

    Ok(InstallPlan {
        selected,
        to_install,
        to_remove,
        install_complete,
    })
}

async fn run_install(ctx: &OpsCtx, force: bool, cancel: CancelToken) -> Result<InstallReport, Error> {
    if !force && ctx.selection.is_install_complete().await? {
        return Err(InstallError::AlreadyInstalled.into());
    }

    let selection = ctx.current_selection().await?;
    let ordered = selection.ordered_names(&ctx.graph);
    save_selection(ctx, &ordered).await?;

    let mut report = run_batch(ctx, ordered.clone(), cancel).await;
    if report.state == BatchState::Cancelled {
        return Ok(report);
    }

    report.handlers = run_handlers(ctx, ordered).await;

    let installed: Vec<&str> = report
        .packages
        .iter()
        .filter(|p| p.outcome.is_success())
        .map(|p| p.name.as_str())
        .collect();
    ctx.selection.save_installed(installed.as_slice()).await?;
    mark_complete(ctx).await?;
    Ok(report)
}

async fn run_reconfigure(ctx: &OpsCtx, cancel: CancelToken) -> Result<InstallReport, Error> {
    let selection = ctx.current_selection().await?;
    let ordered = selection.ordered_names(&ctx.graph);

    let previous_names = match ctx.selection.load_installed().await? {
        Some(names) => names,
        None => ctx.selection.load().await?,
    };
    let previous = SelectionSet::from_names(previous_names.iter().cloned());
    let diff = SelectionSet::diff(&previous, &selection);
    let to_install = ctx.graph.ordered(diff.to_install.iter());

    ctx.emit(AppEvent::Selection(SelectionEvent::DiffComputed {
        to_remove: diff.to_remove.iter().cloned().collect(),
        to_install: to_install.clone(),
    }));

    if !diff.to_remove.is_empty() {
        ctx.emit_step("removing deselected packages");
    }
    let removed = remove_packages(ctx, &diff.to_remove).await;

    let mut report = run_batch(ctx, to_install, cancel).await;
    report.removed.clone_from(&removed);

    // Track what is actually on disk even when the batch was cancelled
    let removed: BTreeSet<&str> = removed.iter().map(String::as_str).collect();
    let mut installed: BTreeSet<String> = previous_names
        .into_iter()
        .filter(|name| !removed.contains(name.as_str()))
        .collect();
    installed.extend(
        report
            .packages
            .iter()
            .filter(|p| p.outcome.is_success())
            .map(|p| p.name.clone()),
    );
    let installed: Vec<String> = installed.into_iter().collect();
    ctx.selection.save_installed(installed.as_slice()).await?;

    if report.state == BatchState::Cancelled {
        return Ok(report);
    }

    report.handlers = run_handlers(ctx, ordered.clone()).await;
    save_selection(ctx, &ordered).await?;
    mark_complete(ctx).await?;
    Ok(report)
}

async fn run_batch(ctx: &OpsCtx, packages: Vec<String>, cancel: CancelToken) -> InstallReport {
    let hook_events = ctx.tx.clone();
    let orchestrator = InstallOrchestrator::new(Arc::clone(&ctx.graph), ctx.new_sync(), packages)
        .with_poll_bound(ctx.config.install.poll_bound)
        .with_always_skip(ctx.config.install.always_skip_package.clone())
        .with_repo_root(ctx.config.repo_root())
        .with_cancel_token(cancel)
        .with_event_sender(ctx.tx.clone())
        .on_finished(move || hook_events.emit_step("running module handlers"));

    orchestrator.drive(ctx.config.tick_interval()).await
}

/// Delete the checkouts of `names`, returning the ones removed
///
/// Failures and refused names are reported as warnings.
pub(crate) async fn remove_packages(ctx: &OpsCtx, names: &BTreeSet<String>) -> Vec<String> {
    if names.is_empty() {
        return Vec::new();
    }

    let repo_root = ctx.config.repo_root();
    let mut sync = ctx.new_sync();
    let mut removed = Vec::with_capacity(names.len());

    for name in names {
        if !is_plain_name(name) {
            ctx.emit_warning_with_context(
                format!("refusing to remove {name}"),
                "package names must be a single path component",
            );
            continue;
        }
        match sync.remove(name, &repo_root.join(name)).await {
            Ok(()) => removed.push(name.clone()),
            Err(e) => {
                tracing::warn!(package = %name, error = %e, "failed to remove package checkout");
                ctx.emit_warning_with_context(format!("failed to remove {name}"), e.to_string());
            }
        }
    }
    removed
}

async fn run_handlers(ctx: &OpsCtx, selected: Vec<String>) -> Vec<HandlerReport> {
    let handler_ctx = ctx.handler_context(selected);
    handler_reports(ctx.handlers.install_all(&handler_ctx).await)
}

pub(crate) fn handler_reports(outcomes: Vec<HandlerOutcome>) -> Vec<HandlerReport> {
    outcomes
        .into_iter()
        .map(|outcome| HandlerReport {
            name: outcome.handler,
            success: outcome.result.is_ok(),
            message: outcome.result.err().map(|e| e.to_string()),
        })
        .collect()
}

async fn save_selection(ctx: &OpsCtx, ordered: &[String]) -> Result<(), Error> {
    ctx.selection.save(ordered).await?;
    ctx.emit(AppEvent::State(StateEvent::SelectionSaved {
        count: ordered.len(),
    }));
    Ok(())
}

async fn mark_complete(ctx: &OpsCtx) -> Result<(), Error> {
    ctx.selection.mark_install_complete().await?;
    ctx.emit(AppEvent::State(StateEvent::CompletionMarked));
    Ok(())
}

fn finish_operation(ctx: &OpsCtx, operation: &str, result: &Result<InstallReport, Error>) {
    match result {
        Ok(report) => {
            let success = report.state == BatchState::Done
                && report.failure_count() == 0
                && report.handlers.iter().all(|h| h.success);
            ctx.emit_operation_completed(operation, success);
        }
        Err(e) => ctx.emit_operation_failed(operation, FailureContext::from_error(e)),
    }
}
