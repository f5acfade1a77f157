//! Git-backed repository sync

use crate::sync::{RepositorySync, SyncCompletion};
use modsync_errors::{Error, InstallError};
use modsync_events::{AppEvent, EventEmitter, EventSender, InstallEvent};
use modsync_types::Package;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const REMOVE_ATTEMPTS: u32 = 3;
const REMOVE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Clones missing checkouts and pulls existing ones
///
/// Each git process runs as a task on the given runtime and reports through
/// the completion when it exits. Tasks are chained: a new package's git only
/// starts once the previous task has ended, so an abandoned clone is killed
/// and cleaned up before anything else touches the repo root.
#[derive(Debug)]
pub struct GitSync {
    runtime: Handle,
    program: PathBuf,
    remote: String,
    branch: String,
    event_sender: Option<EventSender>,
    last_task: Option<JoinHandle<()>>,
    stop_signal: Option<oneshot::Sender<()>>,
}

/// One git invocation, owned by its task
struct GitJob {
    package: String,
    program: PathBuf,
    args: Vec<String>,
    workdir: PathBuf,
    verb: &'static str,
    /// Set for clones: the directory to delete if the clone is stopped
    partial_clone: Option<PathBuf>,
}

impl GitSync {
    /// Create a sync that spawns onto `runtime`
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            program: PathBuf::from("git"),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            event_sender: None,
            last_task: None,
            stop_signal: None,
        }
    }

    /// Remote and branch used for `git pull`
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        self.remote = remote.into();
        self.branch = branch.into();
        self
    }

    /// Use a different git executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    fn command_for(&self, url: &str, destination: &Path) -> (Vec<String>, PathBuf, &'static str) {
        if destination.exists() {
            (
                vec!["pull".into(), self.remote.clone(), self.branch.clone()],
                destination.to_path_buf(),
                "pull",
            )
        } else {
            let workdir = destination
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            (
                vec![
                    "clone".into(),
                    url.to_string(),
                    destination.display().to_string(),
                ],
                workdir,
                "clone",
            )
        }
    }
}

impl GitJob {
    fn failure(&self, message: String) -> InstallError {
        InstallError::GitFailed {
            command: self.verb.to_string(),
            path: self.workdir.display().to_string(),
            message,
        }
    }

    async fn run(self, stop: oneshot::Receiver<()>, completion: SyncCompletion) {
        if let Err(e) = tokio::fs::create_dir_all(&self.workdir).await {
            completion.fail(format!("cannot create {}: {e}", self.workdir.display()));
            return;
        }

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let err = self.failure(e.to_string());
                tracing::warn!(package = %self.package, error = %err, "git could not be started");
                completion.fail(err.to_string());
                return;
            }
        };

        let mut stderr_pipe = child.stderr.take();
        let stderr = async move {
            let mut text = String::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut text).await;
            }
            text
        };

        tokio::select! {
            (status, stderr) = async { tokio::join!(child.wait(), stderr) } => match status {
                Ok(status) if status.success() => completion.complete(true),
                Ok(status) => {
                    let err = self.failure(format!("{status}: {}", stderr.trim()));
                    tracing::warn!(package = %self.package, error = %err, "git failed");
                    completion.fail(err.to_string());
                }
                Err(e) => {
                    let err = self.failure(e.to_string());
                    tracing::warn!(package = %self.package, error = %err, "git could not be awaited");
                    completion.fail(err.to_string());
                }
            },
            _ = stop => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(package = %self.package, error = %e, "failed to kill git");
                }
                if let Some(partial) = &self.partial_clone {
                    match tokio::fs::remove_dir_all(partial).await {
                        Ok(()) => tracing::debug!(package = %self.package, path = %partial.display(), "removed partial clone"),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => tracing::warn!(package = %self.package, error = %e, "failed to remove partial clone"),
                    }
                }
            }
        }
    }
}

impl EventEmitter for GitSync {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

#[async_trait::async_trait]
impl RepositorySync for GitSync {
    fn sync(
        &mut self,
        package: &Package,
        destination: &Path,
        completion: SyncCompletion,
    ) -> Result<(), Error> {
        let Some(url) = package.git_url.as_deref().filter(|_| package.has_repository()) else {
            self.emit(AppEvent::Install(InstallEvent::SyncSkipped {
                package: package.name.clone(),
                reason: "no repository url".to_string(),
            }));
            completion.complete(true);
            return Ok(());
        };

        if destination.exists() && !destination.is_dir() {
            return Err(InstallError::FilesystemError {
                operation: "sync".to_string(),
                path: destination.display().to_string(),
                message: "destination exists and is not a directory".to_string(),
            }
            .into());
        }

        let (args, workdir, verb) = self.command_for(url, destination);
        tracing::debug!(package = %package.name, command = verb, path = %workdir.display(), "starting git");
        let job = GitJob {
            package: package.name.clone(),
            program: self.program.clone(),
            args,
            workdir,
            verb,
            partial_clone: (verb == "clone").then(|| destination.to_path_buf()),
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_signal = Some(stop_tx);
        let previous = self.last_task.take();
        self.last_task = Some(self.runtime.spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            job.run(stop_rx, completion).await;
        }));
        Ok(())
    }

    fn abandon(&mut self, package: &str, destination: &Path) {
        if let Some(stop) = self.stop_signal.take() {
            tracing::debug!(package, path = %destination.display(), "stopping git");
            let _ = stop.send(());
        }
    }

    async fn settle(&mut self) {
        if let Some(task) = self.last_task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "git task ended abnormally");
            }
        }
    }

    async fn remove(&mut self, package: &str, destination: &Path) -> Result<(), Error> {
        let mut last_error = String::new();
        for attempt in 1..=REMOVE_ATTEMPTS {
            if !destination.exists() {
                return Ok(());
            }
            match tokio::fs::remove_dir_all(destination).await {
                Ok(()) => {
                    self.emit(AppEvent::Install(InstallEvent::PackageRemoved {
                        package: package.to_string(),
                    }));
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        package,
                        attempt,
                        error = %e,
                        "failed to remove checkout"
                    );
                    last_error = e.to_string();
                }
            }
            if attempt < REMOVE_ATTEMPTS {
                tokio::time::sleep(REMOVE_RETRY_DELAY).await;
            }
        }
        Err(InstallError::RemoveFailed {
            path: destination.display().to_string(),
            message: last_error,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_existing_destination_pulls_configured_branch() {
        let dir = tempdir().unwrap();
        let sync = GitSync::new(Handle::current()).with_remote("upstream", "develop");
        let (args, workdir, verb) = sync.command_for("https://example.com/x.git", dir.path());
        assert_eq!(verb, "pull");
        assert_eq!(args, vec!["pull", "upstream", "develop"]);
        assert_eq!(workdir, dir.path());
    }

    #[tokio::test]
    async fn test_missing_destination_clones_from_parent() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("repos/ui");
        let sync = GitSync::new(Handle::current());
        let (args, workdir, verb) = sync.command_for("https://example.com/ui.git", &dest);
        assert_eq!(verb, "clone");
        assert_eq!(args[1], "https://example.com/ui.git");
        assert_eq!(workdir, dir.path().join("repos"));
    }

    #[tokio::test]
    async fn test_package_without_url_completes_successfully() {
        let dir = tempdir().unwrap();
        let mut sync = GitSync::new(Handle::current());
        let (completion, receiver) = SyncCompletion::channel();
        sync.sync(&Package::new("local"), &dir.path().join("local"), completion)
            .unwrap();
        assert_eq!(receiver.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_missing_git_binary_reports_failure() {
        let dir = tempdir().unwrap();
        let mut sync = GitSync::new(Handle::current()).with_program("/nonexistent/git-binary");
        let (completion, receiver) = SyncCompletion::channel();
        let package = Package::new("ui").with_git_url("https://example.com/ui.git");
        sync.sync(&package, &dir.path().join("ui"), completion).unwrap();
        assert!(receiver.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_remove_deletes_checkout() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ui");
        std::fs::create_dir_all(dest.join("src")).unwrap();
        std::fs::write(dest.join("src/lib.cs"), "class A {}").unwrap();

        let mut sync = GitSync::new(Handle::current());
        sync.remove("ui", &dest).await.unwrap();
        assert!(!dest.exists());
        // Removing again is fine
        sync.remove("ui", &dest).await.unwrap();
    }
}
