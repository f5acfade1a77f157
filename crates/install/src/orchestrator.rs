//! Tick-driven install orchestrator

use crate::cancel::CancelToken;
use crate::sync::{RepositorySync, SyncCompletion, SyncResult};
use modsync_events::{AppEvent, EventEmitter, EventSender, FailureContext, InstallEvent};
use modsync_resolver::PackageGraph;
use modsync_types::{BatchState, InstallReport, PackageOutcome, PackageReport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::time::MissedTickBehavior;

/// Ticks a package may stay pending before it is timed out
pub const DEFAULT_POLL_BOUND: u32 = 100;

/// Lifecycle of the package currently being installed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    TimedOut,
    Failed,
}

struct InstallationJob {
    package: String,
    destination: PathBuf,
    receiver: oneshot::Receiver<SyncResult>,
    elapsed: u32,
    state: JobState,
}

type FinishHook = Box<dyn FnOnce() + Send>;

/// Installs an ordered package list one package at a time
///
/// Every call to [`tick`](Self::tick) performs exactly one step. A package
/// started on one tick is polled on the following ticks; the next package
/// starts on the tick after the previous one resolved.
pub struct InstallOrchestrator {
    graph: Arc<PackageGraph>,
    sync: Box<dyn RepositorySync>,
    pending: Vec<String>,
    index: usize,
    job: Option<InstallationJob>,
    outcomes: Vec<PackageReport>,
    state: BatchState,
    poll_bound: u32,
    always_skip: Option<String>,
    repo_root: PathBuf,
    cancel: CancelToken,
    on_finished: Option<FinishHook>,
    event_sender: Option<EventSender>,
    started: Option<Instant>,
}

impl InstallOrchestrator {
    /// Create an orchestrator for `packages`, processed in the given order
    pub fn new(graph: Arc<PackageGraph>, sync: Box<dyn RepositorySync>, packages: Vec<String>) -> Self {
        Self {
            graph,
            sync,
            pending: packages,
            index: 0,
            job: None,
            outcomes: Vec::new(),
            state: BatchState::Idle,
            poll_bound: DEFAULT_POLL_BOUND,
            always_skip: None,
            repo_root: PathBuf::from("."),
            cancel: CancelToken::new(),
            on_finished: None,
            event_sender: None,
            started: None,
        }
    }

    #[must_use]
    pub fn with_poll_bound(mut self, poll_bound: u32) -> Self {
        self.poll_bound = poll_bound.max(1);
        self
    }

    /// Package passed over without syncing
    #[must_use]
    pub fn with_always_skip(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        self.always_skip = (!package.is_empty()).then_some(package);
        self
    }

    /// Directory checkouts are placed in, one subdirectory per package
    #[must_use]
    pub fn with_repo_root(mut self, repo_root: impl Into<PathBuf>) -> Self {
        self.repo_root = repo_root.into();
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Hook fired exactly once when the batch reaches `Done`
    #[must_use]
    pub fn on_finished(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_finished = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// State of the package currently in flight
    #[must_use]
    pub fn job_state(&self) -> Option<(&str, JobState)> {
        self.job.as_ref().map(|job| (job.package.as_str(), job.state))
    }

    #[must_use]
    pub fn outcomes(&self) -> &[PackageReport] {
        &self.outcomes
    }

    /// Perform one step and return the resulting batch state
    pub fn tick(&mut self) -> BatchState {
        match self.state {
            BatchState::Idle => {
                self.started = Some(Instant::now());
                self.state = BatchState::Processing;
                self.emit(AppEvent::Install(InstallEvent::BatchStarted {
                    total: self.pending.len(),
                }));
                return self.state;
            }
            BatchState::Done | BatchState::Cancelled => return self.state,
            BatchState::Processing => {}
        }

        if self.job.is_some() {
            self.poll_job();
        } else if self.index >= self.pending.len() {
            self.finish();
        } else if self.cancel.is_cancelled() {
            self.cancel_remaining();
        } else {
            self.start_next();
        }
        self.state
    }

    /// Run ticks on a fixed interval until the batch is done or cancelled
    ///
    /// Returns once the sync has no work left running, so a timed-out
    /// package cannot outlive the batch.
    pub async fn drive(mut self, interval: Duration) -> InstallReport {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.tick().is_terminal() {
                break;
            }
        }
        self.sync.settle().await;
        self.into_report()
    }

    /// Report of everything processed so far
    #[must_use]
    pub fn report(&self) -> InstallReport {
        let duration_ms = self
            .started
            .map_or(0, |t| u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX));
        InstallReport {
            packages: self.outcomes.clone(),
            removed: Vec::new(),
            handlers: Vec::new(),
            state: self.state,
            duration_ms,
        }
    }

    #[must_use]
    pub fn into_report(self) -> InstallReport {
        self.report()
    }

    fn poll_job(&mut self) {
        let Some(mut job) = self.job.take() else {
            return;
        };

        let outcome = match job.receiver.try_recv() {
            Ok(Ok(())) => {
                job.state = JobState::Completed;
                self.emit(AppEvent::Install(InstallEvent::PackageCompleted {
                    package: job.package.clone(),
                }));
                PackageOutcome::Completed
            }
            Ok(Err(reason)) => self.job_failed(&mut job, reason),
            Err(TryRecvError::Closed) => {
                self.job_failed(&mut job, "completion dropped without a result".to_string())
            }
            Err(TryRecvError::Empty) => {
                job.elapsed += 1;
                if job.elapsed < self.poll_bound {
                    self.job = Some(job);
                    return;
                }
                job.state = JobState::TimedOut;
                tracing::warn!(package = %job.package, ticks = job.elapsed, "install timed out, continuing");
                self.sync.abandon(&job.package, &job.destination);
                self.emit(AppEvent::Install(InstallEvent::PackageTimedOut {
                    package: job.package.clone(),
                    ticks: job.elapsed,
                }));
                PackageOutcome::TimedOut { ticks: job.elapsed }
            }
        };

        self.record(job.package, outcome);
    }

    fn job_failed(&self, job: &mut InstallationJob, reason: String) -> PackageOutcome {
        job.state = JobState::Failed;
        tracing::warn!(package = %job.package, %reason, "install failed, continuing");
        self.emit(AppEvent::Install(InstallEvent::PackageFailed {
            package: job.package.clone(),
            failure: FailureContext::message(reason.clone()),
        }));
        PackageOutcome::Failed { reason }
    }

    fn start_next(&mut self) {
        let name = self.pending[self.index].clone();
        self.emit_package_progress(self.index + 1, self.pending.len(), name.clone());

        if self.always_skip.as_deref() == Some(name.as_str()) {
            self.emit(AppEvent::Install(InstallEvent::PackageSkipped {
                package: name.clone(),
            }));
            self.record(name, PackageOutcome::Skipped);
            return;
        }

        let graph = Arc::clone(&self.graph);
        let Some(package) = graph.find_by_name(&name) else {
            tracing::warn!(package = %name, "package not in manifest, skipping");
            self.emit(AppEvent::Install(InstallEvent::PackageNotFound {
                package: name.clone(),
            }));
            self.record(name, PackageOutcome::NotFound);
            return;
        };

        let destination = self.repo_root.join(&package.name);
        let (completion, receiver) = SyncCompletion::channel();
        match self.sync.sync(package, &destination, completion) {
            Ok(()) => {
                self.emit(AppEvent::Install(InstallEvent::SyncStarted {
                    package: name.clone(),
                    destination: destination.clone(),
                }));
                self.job = Some(InstallationJob {
                    package: name,
                    destination,
                    receiver,
                    elapsed: 0,
                    state: JobState::Running,
                });
            }
            Err(e) => {
                tracing::warn!(package = %name, error = %e, "sync could not start");
                self.emit(AppEvent::Install(InstallEvent::PackageFailed {
                    package: name.clone(),
                    failure: FailureContext::from_error(&e),
                }));
                self.record(name, PackageOutcome::Failed { reason: e.to_string() });
            }
        }
    }

    fn record(&mut self, name: String, outcome: PackageOutcome) {
        self.outcomes.push(PackageReport { name, outcome });
        self.index += 1;
    }

    fn finish(&mut self) {
        self.state = BatchState::Done;
        let count = |f: fn(&PackageOutcome) -> bool| self.outcomes.iter().filter(|p| f(&p.outcome)).count();
        let completed = count(|o| matches!(o, PackageOutcome::Completed));
        let skipped = count(|o| matches!(o, PackageOutcome::Skipped));
        let failed = self.outcomes.len() - completed - skipped;
        self.emit(AppEvent::Install(InstallEvent::BatchCompleted {
            completed,
            skipped,
            failed,
        }));
        if let Some(hook) = self.on_finished.take() {
            hook();
        }
    }

    fn cancel_remaining(&mut self) {
        let remaining = self.pending.len() - self.index;
        for name in self.pending[self.index..].to_vec() {
            self.outcomes.push(PackageReport {
                name,
                outcome: PackageOutcome::Cancelled,
            });
        }
        self.index = self.pending.len();
        self.state = BatchState::Cancelled;
        self.emit(AppEvent::Install(InstallEvent::BatchCancelled { remaining }));
    }
}

impl EventEmitter for InstallOrchestrator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl std::fmt::Debug for InstallOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallOrchestrator")
            .field("pending", &self.pending)
            .field("index", &self.index)
            .field("state", &self.state)
            .field("poll_bound", &self.poll_bound)
            .finish_non_exhaustive()
    }
}
