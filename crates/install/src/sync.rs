//! Repository sync contract

use modsync_errors::Error;
use modsync_types::Package;
use std::path::Path;
use tokio::sync::oneshot;

/// Value delivered through a [`SyncCompletion`]: `Err` carries the reason
pub type SyncResult = Result<(), String>;

/// One-shot completion handle passed to [`RepositorySync::sync`]
///
/// Reporting consumes the handle, so a sync can only report once. Dropping
/// it without reporting counts as a failure.
#[derive(Debug)]
pub struct SyncCompletion {
    sender: oneshot::Sender<SyncResult>,
}

impl SyncCompletion {
    /// Create a handle and the receiver the orchestrator polls
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<SyncResult>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Report the outcome of the sync
    pub fn complete(self, success: bool) {
        let result = if success {
            Ok(())
        } else {
            Err("repository sync reported failure".to_string())
        };
        self.finish(result);
    }

    /// Report a failure with a reason
    pub fn fail(self, reason: impl Into<String>) {
        self.finish(Err(reason.into()));
    }

    fn finish(self, result: SyncResult) {
        // The orchestrator may have timed the job out already
        let _ = self.sender.send(result);
    }
}

/// Brings a package's checkout up to date
#[async_trait::async_trait]
pub trait RepositorySync: Send {
    /// Start syncing `package` into `destination`
    ///
    /// Must not block. The outcome is reported later through `completion`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync cannot be started at all; the package is
    /// then recorded as failed and the batch moves on.
    fn sync(
        &mut self,
        package: &Package,
        destination: &Path,
        completion: SyncCompletion,
    ) -> Result<(), Error>;

    /// Stop the sync of a package the orchestrator timed out
    ///
    /// Must not block. Work for the next package must not begin until the
    /// abandoned work has stopped.
    fn abandon(&mut self, package: &str, destination: &Path) {
        let _ = (package, destination);
    }

    /// Wait until no sync work is left running
    async fn settle(&mut self) {}

    /// Delete the checkout of a deselected package
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout cannot be removed.
    async fn remove(&mut self, package: &str, destination: &Path) -> Result<(), Error> {
        let _ = (package, destination);
        Ok(())
    }
}

/// Sync that succeeds immediately without touching the filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSync;

#[async_trait::async_trait]
impl RepositorySync for NoopSync {
    fn sync(
        &mut self,
        _package: &Package,
        _destination: &Path,
        completion: SyncCompletion,
    ) -> Result<(), Error> {
        completion.complete(true);
        Ok(())
    }
}
