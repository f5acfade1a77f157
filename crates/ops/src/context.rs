//! Operations context for dependency injection

use modsync_config::Config;
use modsync_errors::{Error, OpsError};
use modsync_events::{AppEvent, EventEmitter, EventSender, SelectionEvent};
use modsync_install::{EnvironmentHandler, GitSync, HandlerContext, HandlerRegistry, RepositorySync};
use modsync_resolver::{PackageGraph, SelectionSet};
use modsync_state::{JsonFileStore, KeyValueStore, PersistedSelection};
use modsync_types::Manifest;
use std::sync::Arc;

/// Produces a fresh repository sync for each batch
pub type SyncFactory = Arc<dyn Fn() -> Box<dyn RepositorySync> + Send + Sync>;

/// Operations context providing access to all system components
pub struct OpsCtx {
    /// Package graph built from the manifest
    pub graph: Arc<PackageGraph>,
    /// Manifest the graph was built from
    pub manifest: Manifest,
    /// Persisted selection and completion flag
    pub selection: PersistedSelection,
    /// Post-install handlers
    pub handlers: HandlerRegistry,
    /// Repository sync used by install batches
    pub sync_factory: SyncFactory,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// System configuration
    pub config: Config,
}

impl OpsCtx {
    // No public constructor - use OpsContextBuilder instead

    /// Required closure merged with the persisted names
    ///
    /// # Errors
    ///
    /// Returns an error if the graph has a cycle or the store fails.
    pub async fn current_selection(&self) -> Result<SelectionSet, Error> {
        let mut selection = SelectionSet::initialize_from_graph(&self.graph)?;
        self.emit(AppEvent::Selection(SelectionEvent::Initialized {
            selected: selection.len(),
        }));

        let persisted = self.selection.load().await?;
        let summary = selection.merge_with_persisted(&self.graph, &persisted);
        for package in summary.ignored {
            self.emit(AppEvent::Selection(SelectionEvent::UnknownPersisted { package }));
        }
        self.emit(AppEvent::Selection(SelectionEvent::PersistedMerged {
            added: summary.added.len(),
        }));
        Ok(selection)
    }

    /// Context handed to module handlers
    #[must_use]
    pub fn handler_context(&self, selected: Vec<String>) -> HandlerContext {
        HandlerContext {
            project_root: self.config.project_root(),
            environment_file: self.config.environment_file(),
            system_paths: self.manifest.system_paths.clone(),
            selected,
            event_sender: Some(self.tx.clone()),
        }
    }

    /// Create the sync for a new batch
    #[must_use]
    pub fn new_sync(&self) -> Box<dyn RepositorySync> {
        (self.sync_factory)()
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl std::fmt::Debug for OpsCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsCtx")
            .field("packages", &self.graph.len())
            .field("handlers", &self.handlers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    manifest: Option<Manifest>,
    store: Option<Arc<dyn KeyValueStore>>,
    handlers: Option<HandlerRegistry>,
    sync_factory: Option<SyncFactory>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the manifest
    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Set the key/value store (defaults to a JSON file at the configured state path)
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the handler registry (defaults to the environment handler only)
    #[must_use]
    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Set the repository sync factory (defaults to git)
    #[must_use]
    pub fn with_sync_factory(mut self, factory: SyncFactory) -> Self {
        self.sync_factory = Some(factory);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if a required component is missing, the manifest is
    /// empty or inconsistent, or the default git sync is requested outside a
    /// tokio runtime.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let manifest = self.manifest.ok_or_else(|| OpsError::MissingComponent {
            component: "manifest".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event sender".to_string(),
        })?;

        let config = self.config.unwrap_or_default();

        let graph = PackageGraph::from_packages(manifest.packages.clone())?;
        graph.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(JsonFileStore::new(config.state_path())));

        let handlers = self.handlers.unwrap_or_else(|| {
            let mut registry = HandlerRegistry::new();
            registry.register(Box::new(EnvironmentHandler));
            registry
        });

        let sync_factory = match self.sync_factory {
            Some(factory) => factory,
            None => {
                let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
                    OpsError::MissingComponent {
                        component: "tokio runtime".to_string(),
                    }
                })?;
                let remote = config.install.git_remote.clone();
                let branch = config.install.git_branch.clone();
                let events = tx.clone();
                let factory: SyncFactory = Arc::new(move || -> Box<dyn RepositorySync> {
                    Box::new(
                        GitSync::new(runtime.clone())
                            .with_remote(remote.clone(), branch.clone())
                            .with_event_sender(events.clone()),
                    )
                });
                factory
            }
        };

        Ok(OpsCtx {
            graph: Arc::new(graph),
            manifest,
            selection: PersistedSelection::new(store),
            handlers,
            sync_factory,
            tx,
            config,
        })
    }
}
