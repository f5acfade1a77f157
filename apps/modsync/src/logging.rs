//! Structured logging integration for events
//!
//! Every event that reaches the CLI is mirrored into tracing, at the level
//! carried by its metadata, so debug log files hold the full event stream.

use modsync_events::{AppEvent, EventMessage, GeneralEvent, InstallEvent};
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;
    let level = meta.tracing_level();
    let domain = event.log_target();

    match event {
        AppEvent::Install(InstallEvent::PackageFailed { package, failure }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                domain,
                package = %package,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Package sync failed"
            );
        }
        AppEvent::Install(InstallEvent::PackageTimedOut { package, ticks }) => {
            warn!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                domain,
                package = %package,
                ticks = ticks,
                "Package sync timed out"
            );
        }
        AppEvent::Install(InstallEvent::HandlerFailed { handler, failure }) => {
            error!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                domain,
                handler = %handler,
                code = ?failure.code,
                message = %failure.message,
                "Module handler failed"
            );
        }
        AppEvent::General(GeneralEvent::OperationFailed { operation, failure }) => {
            if failure.retryable {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    domain,
                    operation = %operation,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Operation failed"
                );
            } else {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    domain,
                    operation = %operation,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Operation failed"
                );
            }
        }
        AppEvent::General(GeneralEvent::Warning { message, context }) => {
            warn!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                domain,
                message = %message,
                context = ?context,
                "Warning"
            );
        }
        AppEvent::General(GeneralEvent::DebugLog { message, context }) => {
            debug!(
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                domain,
                message = %message,
                context = ?context,
                "Debug log"
            );
        }
        _ => match level {
            tracing::Level::ERROR => {
                error!(source = meta.source.as_str(), event_id = %meta.event_id, domain, event = ?event, "Application event");
            }
            tracing::Level::WARN => {
                warn!(source = meta.source.as_str(), event_id = %meta.event_id, domain, event = ?event, "Application event");
            }
            tracing::Level::INFO => {
                info!(source = meta.source.as_str(), event_id = %meta.event_id, domain, event = ?event, "Application event");
            }
            tracing::Level::DEBUG => {
                debug!(source = meta.source.as_str(), event_id = %meta.event_id, domain, event = ?event, "Application event");
            }
            tracing::Level::TRACE => {
                trace!(source = meta.source.as_str(), event_id = %meta.event_id, domain, event = ?event, "Application event");
            }
        },
    }
}
