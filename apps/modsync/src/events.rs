//! Event handling and progress display

use console::{style, Term};
use modsync_events::{
    AppEvent, EventMessage, GeneralEvent, InstallEvent, SelectionEvent, StateEvent,
};

/// Turns events into progress lines on stderr
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Suppress terminal output, used with `--json`
    quiet: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        crate::logging::log_event_with_tracing(&message);

        if self.quiet {
            return;
        }
        if let Some(line) = self.format_event(&message.event) {
            self.show(&line);
        }
    }

    /// Line shown for an event, if it is user facing
    fn format_event(&self, event: &AppEvent) -> Option<String> {
        match event {
            AppEvent::General(event) => self.format_general(event),
            AppEvent::Install(event) => self.format_install(event),
            AppEvent::Selection(event) => self.format_selection(event),
            AppEvent::State(event) => self.format_state(event),
        }
    }

    fn format_general(&self, event: &GeneralEvent) -> Option<String> {
        match event {
            GeneralEvent::Info { message } => Some(message.clone()),
            GeneralEvent::Warning { message, context } => Some(match context {
                Some(context) => format!("{} {message} ({context})", self.warn_tag()),
                None => format!("{} {message}", self.warn_tag()),
            }),
            GeneralEvent::Error { message, details } => Some(match details {
                Some(details) => format!("{} {message}: {details}", self.error_tag()),
                None => format!("{} {message}", self.error_tag()),
            }),
            GeneralEvent::DebugLog { message, .. } => {
                self.debug_enabled.then(|| format!("[debug] {message}"))
            }
            GeneralEvent::StepChanged { step } => Some(self.step(step)),
            GeneralEvent::OperationStarted { operation } => {
                self.debug_enabled.then(|| format!("Starting {operation}"))
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if *success {
                    Some(format!("{} {operation} finished", self.ok_tag()))
                } else {
                    Some(format!(
                        "{} {operation} finished with problems",
                        self.warn_tag()
                    ))
                }
            }
            // The error itself is printed when the command returns
            GeneralEvent::OperationFailed { .. } => None,
        }
    }

    fn format_install(&self, event: &InstallEvent) -> Option<String> {
        match event {
            InstallEvent::BatchStarted { total } => Some(self.step(&format!(
                "installing {total} package{}",
                if *total == 1 { "" } else { "s" }
            ))),
            InstallEvent::PackageProgress {
                current,
                total,
                package,
            } => Some(format!("[{current}/{total}] {package}")),
            InstallEvent::SyncStarted {
                package,
                destination,
            } => self
                .debug_enabled
                .then(|| format!("  syncing {package} into {}", destination.display())),
            InstallEvent::SyncSkipped { package, reason } => self
                .debug_enabled
                .then(|| format!("  {package}: {reason}")),
            InstallEvent::PackageSkipped { package } => {
                Some(format!("  {package} skipped (always present)"))
            }
            InstallEvent::PackageNotFound { package } => {
                Some(format!("{} {package} is not in the manifest", self.warn_tag()))
            }
            InstallEvent::PackageCompleted { package } => {
                Some(format!("{} {package}", self.ok_tag()))
            }
            InstallEvent::PackageFailed { package, failure } => Some(format!(
                "{} {package}: {}",
                self.error_tag(),
                failure.message
            )),
            InstallEvent::PackageTimedOut { package, ticks } => Some(format!(
                "{} {package} did not finish within {ticks} ticks",
                self.warn_tag()
            )),
            InstallEvent::PackageRemoved { package } => Some(format!("  removed {package}")),
            InstallEvent::BatchCompleted {
                completed,
                skipped,
                failed,
            } => Some(format!(
                "{completed} completed, {skipped} skipped, {failed} failed"
            )),
            InstallEvent::BatchCancelled { remaining } => Some(format!(
                "{} cancelled with {remaining} package(s) left",
                self.warn_tag()
            )),
            InstallEvent::HandlerCompleted { handler } => {
                Some(format!("{} handler {handler}", self.ok_tag()))
            }
            InstallEvent::HandlerFailed { handler, failure } => Some(format!(
                "{} handler {handler}: {}",
                self.error_tag(),
                failure.message
            )),
        }
    }

    fn format_selection(&self, event: &SelectionEvent) -> Option<String> {
        match event {
            SelectionEvent::UnknownPersisted { package } => Some(format!(
                "{} ignoring stored package {package}, it is no longer in the manifest",
                self.warn_tag()
            )),
            SelectionEvent::Changed { package, selected } => Some(if *selected {
                format!("  + {package}")
            } else {
                format!("  - {package}")
            }),
            SelectionEvent::DiffComputed {
                to_remove,
                to_install,
            } => Some(format!(
                "{} to remove, {} to install",
                to_remove.len(),
                to_install.len()
            )),
            SelectionEvent::Initialized { .. } | SelectionEvent::PersistedMerged { .. } => None,
        }
    }

    fn format_state(&self, event: &StateEvent) -> Option<String> {
        match event {
            StateEvent::Reset => Some("Stored selection cleared".to_string()),
            StateEvent::SelectionSaved { .. } | StateEvent::CompletionMarked => self
                .debug_enabled
                .then(|| format!("[debug] {event:?}")),
        }
    }

    fn step(&self, text: &str) -> String {
        if self.colors_enabled {
            format!("{} {}", style("==>").cyan().bold(), style(text).bold())
        } else {
            format!("==> {text}")
        }
    }

    fn ok_tag(&self) -> String {
        self.tag("[OK]", console::Color::Green)
    }

    fn warn_tag(&self) -> String {
        self.tag("[WARN]", console::Color::Yellow)
    }

    fn error_tag(&self) -> String {
        self.tag("[ERROR]", console::Color::Red)
    }

    fn tag(&self, text: &str, color: console::Color) -> String {
        if self.colors_enabled {
            style(text).fg(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Show status message
    fn show(&self, message: &str) {
        // A closed stderr is not worth failing the command over
        let _ = self.term.write_line(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsync_events::FailureContext;

    fn plain() -> EventHandler {
        EventHandler::new(false, false, true)
    }

    #[test]
    fn test_progress_line() {
        let line = plain().format_event(&AppEvent::Install(InstallEvent::PackageProgress {
            current: 2,
            total: 5,
            package: "ui".into(),
        }));
        assert_eq!(line.as_deref(), Some("[2/5] ui"));
    }

    #[test]
    fn test_failure_line_uses_failure_message() {
        let line = plain().format_event(&AppEvent::Install(InstallEvent::PackageFailed {
            package: "net".into(),
            failure: FailureContext::message("exit code 128"),
        }));
        assert_eq!(line.as_deref(), Some("[ERROR] net: exit code 128"));
    }

    #[test]
    fn test_debug_lines_hidden_by_default() {
        let event = AppEvent::General(GeneralEvent::debug("noise"));
        assert!(plain().format_event(&event).is_none());
        assert!(EventHandler::new(false, true, true)
            .format_event(&event)
            .is_some());
    }

    #[test]
    fn test_quiet_handler_accepts_events() {
        let mut handler = plain();
        handler.handle_event(EventMessage::from_event(AppEvent::State(StateEvent::Reset)));
    }
}
