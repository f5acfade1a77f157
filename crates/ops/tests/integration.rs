//! Integration tests for high-level operations

#[cfg(test)]
mod tests {
    use modsync_config::Config;
    use modsync_errors::{Error, InstallError, OpsError, PackageError};
    use modsync_events::{channel, AppEvent, EventReceiver, SelectionEvent, StateEvent};
    use modsync_install::{EnvironmentFile, HandlerRegistry, RepositorySync, SyncCompletion};
    use modsync_ops::*;
    use modsync_state::{JsonFileStore, KeyValueStore, MemoryStore, PersistedSelection};
    use modsync_types::{BatchState, Manifest, Package, PackageOutcome, SystemPath};
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Completes every sync immediately and records calls
    struct RecordingSync {
        log: Log,
    }

    #[async_trait::async_trait]
    impl RepositorySync for RecordingSync {
        fn sync(
            &mut self,
            package: &Package,
            _destination: &Path,
            completion: SyncCompletion,
        ) -> Result<(), Error> {
            self.log.lock().unwrap().push(format!("sync:{}", package.name));
            completion.complete(true);
            Ok(())
        }

        async fn remove(&mut self, package: &str, _destination: &Path) -> Result<(), Error> {
            self.log.lock().unwrap().push(format!("remove:{package}"));
            Ok(())
        }
    }

    struct Fixture {
        ctx: OpsCtx,
        rx: EventReceiver,
        log: Log,
        store: Arc<MemoryStore>,
        dir: TempDir,
    }

    fn manifest() -> Manifest {
        Manifest {
            packages: vec![
                Package::new("common").with_required(true),
                Package::new("core")
                    .with_required(true)
                    .with_dependencies(["log"])
                    .with_git_url("https://example.com/core.git"),
                Package::new("log").with_git_url("https://example.com/log.git"),
                Package::new("ui")
                    .with_description("User interface widgets")
                    .with_git_url("https://example.com/ui.git"),
                Package::new("net").with_git_url("https://example.com/net.git"),
            ],
            system_paths: vec![SystemPath {
                name: "DATA_DIR".into(),
                default_value: "data".into(),
                required: true,
            }],
        }
    }

    fn fixture_with_store(store: Arc<MemoryStore>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.project_root = Some(dir.path().to_path_buf());
        config.install.tick_interval_ms = 1;

        let log: Log = Arc::default();
        let factory_log = Arc::clone(&log);
        let factory: SyncFactory = Arc::new(move || -> Box<dyn RepositorySync> {
            Box::new(RecordingSync {
                log: Arc::clone(&factory_log),
            })
        });

        let (tx, rx) = channel();
        let ctx = OpsContextBuilder::new()
            .with_manifest(manifest())
            .with_store(Arc::clone(&store) as Arc<dyn KeyValueStore>)
            .with_sync_factory(factory)
            .with_event_sender(tx)
            .with_config(config)
            .build()
            .unwrap();

        Fixture {
            ctx,
            rx,
            log,
            store,
            dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_store(Arc::new(MemoryStore::new()))
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(message) = rx.try_recv() {
            events.push(message.event);
        }
        events
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_builder_requires_manifest() {
        let (tx, _rx) = channel();
        let err = OpsContextBuilder::new()
            .with_event_sender(tx)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ops(OpsError::MissingComponent { ref component }) if component == "manifest"
        ));
    }

    #[test]
    fn test_builder_rejects_cycles() {
        let (tx, _rx) = channel();
        let manifest = Manifest {
            packages: vec![
                Package::new("a").with_dependencies(["b"]),
                Package::new("b").with_dependencies(["a"]),
            ],
            system_paths: Vec::new(),
        };
        let err = OpsContextBuilder::new()
            .with_manifest(manifest)
            .with_store(Arc::new(MemoryStore::new()))
            .with_event_sender(tx)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::CyclicDependency { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_packages_marks_required_closure() {
        let f = fixture();
        let rows = list_packages(&f.ctx, None).await.unwrap();
        let selected: Vec<&str> = rows
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(selected, ["common", "core", "log"]);
        assert_eq!(rows.len(), 5);

        let filtered = list_packages(&f.ctx, Some("widgets")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "ui");
    }

    #[tokio::test]
    async fn test_select_persists_in_manifest_order() {
        let mut f = fixture();
        let selection = select(&f.ctx, &names(&["net", "ui"]), true).await.unwrap();
        assert_eq!(selection, names(&["common", "core", "log", "ui", "net"]));

        let persisted = PersistedSelection::new(f.store.clone()).load().await.unwrap();
        assert_eq!(persisted, selection);

        let events = drain(&mut f.rx);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Selection(SelectionEvent::Changed { package, selected: true }) if package == "ui"
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::State(StateEvent::SelectionSaved { count: 5 }))));
    }

    #[tokio::test]
    async fn test_select_rejects_unknown_and_empty() {
        let f = fixture();
        let err = select(&f.ctx, &names(&["ghost"]), true).await.unwrap_err();
        assert!(matches!(err, Error::Package(PackageError::NotFound { .. })));

        let err = select(&f.ctx, &[], true).await.unwrap_err();
        assert!(matches!(err, Error::Ops(OpsError::NoPackagesSpecified)));
    }

    #[tokio::test]
    async fn test_required_packages_stay_selected() {
        let f = fixture();
        let selection = select(&f.ctx, &names(&["core"]), false).await.unwrap();
        assert!(selection.contains(&"core".to_string()));
    }

    #[tokio::test]
    async fn test_install_syncs_selection_and_marks_complete() {
        let f = fixture();
        select(&f.ctx, &names(&["ui"]), true).await.unwrap();

        let report = install(&f.ctx, false, CancelToken::new()).await.unwrap();
        assert_eq!(report.state, BatchState::Done);
        assert_eq!(report.outcome("common"), Some(&PackageOutcome::Skipped));
        assert_eq!(report.outcome("ui"), Some(&PackageOutcome::Completed));
        assert_eq!(
            *f.log.lock().unwrap(),
            names(&["sync:core", "sync:log", "sync:ui"])
        );
        assert_eq!(report.handlers.len(), 1);
        assert!(report.handlers[0].success);

        let persisted = PersistedSelection::new(f.store.clone());
        assert!(persisted.is_install_complete().await.unwrap());
        assert_eq!(
            persisted.load_installed().await.unwrap(),
            Some(names(&["common", "core", "log", "ui"]))
        );

        let env = EnvironmentFile::load(&f.dir.path().join("system_environments.json"))
            .await
            .unwrap();
        assert_eq!(env.variables.len(), 1);
        assert!(f.dir.path().join("data").is_dir());
    }

    #[tokio::test]
    async fn test_second_install_requires_force() {
        let f = fixture();
        install(&f.ctx, false, CancelToken::new()).await.unwrap();

        let err = install(&f.ctx, false, CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Install(InstallError::AlreadyInstalled)));

        let report = install(&f.ctx, true, CancelToken::new()).await.unwrap();
        assert_eq!(report.state, BatchState::Done);
    }

    #[tokio::test]
    async fn test_cancelled_install_is_not_marked_complete() {
        let f = fixture();
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = install(&f.ctx, false, cancel).await.unwrap();
        assert_eq!(report.state, BatchState::Cancelled);
        assert!(report.handlers.is_empty());
        assert!(f.log.lock().unwrap().is_empty());

        let persisted = PersistedSelection::new(f.store.clone());
        assert!(!persisted.is_install_complete().await.unwrap());
    }

    #[tokio::test]
    async fn test_reconfigure_removes_then_installs() {
        let f = fixture();
        select(&f.ctx, &names(&["ui"]), true).await.unwrap();
        install(&f.ctx, false, CancelToken::new()).await.unwrap();
        f.log.lock().unwrap().clear();

        select(&f.ctx, &names(&["ui"]), false).await.unwrap();
        select(&f.ctx, &names(&["net"]), true).await.unwrap();

        let planned = plan(&f.ctx).await.unwrap();
        assert_eq!(planned.to_remove, names(&["ui"]));
        assert_eq!(planned.to_install, names(&["net"]));
        assert!(planned.install_complete);

        let report = reconfigure(&f.ctx, CancelToken::new()).await.unwrap();
        assert_eq!(report.removed, names(&["ui"]));
        assert_eq!(*f.log.lock().unwrap(), names(&["remove:ui", "sync:net"]));

        let persisted = PersistedSelection::new(f.store.clone());
        assert_eq!(
            persisted.load_installed().await.unwrap(),
            Some(names(&["common", "core", "log", "net"]))
        );
    }

    #[tokio::test]
    async fn test_plan_before_install_lists_whole_selection() {
        let f = fixture();
        let planned = plan(&f.ctx).await.unwrap();
        assert_eq!(planned.selected, names(&["common", "core", "log"]));
        assert_eq!(planned.to_install, planned.selected);
        assert!(planned.to_remove.is_empty());
        assert!(!planned.install_complete);
    }

    #[tokio::test]
    async fn test_plan_and_list_leave_state_file_untouched() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("modsync_data/state.json");
        let (tx, _rx) = channel();
        let ctx = OpsContextBuilder::new()
            .with_manifest(manifest())
            .with_store(Arc::new(JsonFileStore::new(&state_path)))
            .with_sync_factory(Arc::new(|| -> Box<dyn RepositorySync> {
                Box::new(modsync_install::NoopSync)
            }))
            .with_event_sender(tx)
            .build()
            .unwrap();

        let planned = plan(&ctx).await.unwrap();
        assert_eq!(planned.to_install, names(&["common", "core", "log"]));
        list_packages(&ctx, None).await.unwrap();

        assert!(!state_path.exists());
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let mut f = fixture();
        select(&f.ctx, &names(&["ui"]), true).await.unwrap();
        install(&f.ctx, false, CancelToken::new()).await.unwrap();
        let env_file = f.dir.path().join("system_environments.json");
        assert!(env_file.exists());
        f.log.lock().unwrap().clear();

        let report = reset(&f.ctx).await.unwrap();

        // common is never synced, so there is no checkout to delete
        assert_eq!(report.removed, names(&["core", "log", "ui"]));
        assert_eq!(
            *f.log.lock().unwrap(),
            names(&["remove:core", "remove:log", "remove:ui"])
        );
        assert_eq!(report.handlers.len(), 1);
        assert!(report.is_success());
        assert!(!env_file.exists());
        assert!(!f.dir.path().join("data").exists());

        let persisted = PersistedSelection::new(f.store.clone());
        assert!(!persisted.is_install_complete().await.unwrap());
        assert_eq!(persisted.load_installed().await.unwrap(), None);
        assert!(drain(&mut f.rx)
            .iter()
            .any(|e| matches!(e, AppEvent::State(StateEvent::Reset))));
    }

    #[tokio::test]
    async fn test_unknown_persisted_names_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        PersistedSelection::new(store.clone())
            .save(names(&["ui", "retired"]).as_slice())
            .await
            .unwrap();

        let mut f = fixture_with_store(store);
        let rows = list_packages(&f.ctx, None).await.unwrap();
        assert!(rows.iter().any(|r| r.name == "ui" && r.selected));
        assert!(drain(&mut f.rx).iter().any(|e| matches!(
            e,
            AppEvent::Selection(SelectionEvent::UnknownPersisted { package }) if package == "retired"
        )));
    }

    #[test]
    fn test_operation_result_json() {
        let result = OperationResult::Selection(names(&["core"]));
        let json = result.to_json().unwrap();
        assert!(json.contains("\"type\": \"Selection\""));
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_empty_handler_registry() {
        let store = Arc::new(MemoryStore::new());
        let (tx, _rx) = channel();
        let factory: SyncFactory =
            Arc::new(|| -> Box<dyn RepositorySync> { Box::new(modsync_install::NoopSync) });
        let mut config = Config::default();
        config.install.tick_interval_ms = 1;
        let ctx = OpsContextBuilder::new()
            .with_manifest(manifest())
            .with_store(store)
            .with_handlers(HandlerRegistry::new())
            .with_sync_factory(factory)
            .with_event_sender(tx)
            .with_config(config)
            .build()
            .unwrap();

        let report = install(&ctx, false, CancelToken::new()).await.unwrap();
        assert!(report.handlers.is_empty());
        assert!(OperationResult::InstallReport(report).is_success());
    }
}
