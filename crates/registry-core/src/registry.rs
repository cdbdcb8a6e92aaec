//! `SchemaRegistry`: the facade tying the projector (C4), master
//! coordinator (C5), registration pipeline (C6), read API (C7), and
//! producer/barrier (C8) together into one object constructed at startup
//! and torn down on shutdown (§9, "no process-wide singletons beyond the
//! root registry object").

use std::sync::Arc;

use tokio::sync::{oneshot, RwLock};

use registry_bus::{LogBus, OffsetWatcher};
use registry_master::{ElectionTransport, MasterCoordinator};
use registry_schema::{resolve_references, ParseMode, TypedSchema};
use registry_store::{Catalog, SchemaEntry, SharedCatalog, StoreResult, SubjectSchemas};
use registry_types::{Reference, SchemaId, SchemaType, SubjectName, Version, VersionSelector};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::pipeline::RegistrationPipeline;
use crate::producer::Producer;

/// The running registry: owns the background projector task, the master
/// coordinator task, and exposes the read/write surface a server would
/// wire to an HTTP layer.
pub struct SchemaRegistry<B: LogBus + 'static> {
    catalog: SharedCatalog,
    pipeline: RegistrationPipeline<B>,
    master: MasterCoordinator,
    projector_shutdown: Option<oneshot::Sender<()>>,
    projector_handle: Option<tokio::task::JoinHandle<()>>,
}

impl<B: LogBus + 'static> SchemaRegistry<B> {
    /// Start the registry: spawns the projector task and the master
    /// coordinator task, then returns once both are running. Does not
    /// block on the projector reaching readiness; callers poll
    /// `is_ready()`.
    pub async fn start<T>(config: RegistryConfig, bus: Arc<B>, transport: Arc<T>) -> RegistryResult<Self>
    where
        T: ElectionTransport + 'static,
    {
        config.validate()?;

        let catalog: SharedCatalog = Arc::new(RwLock::new(Catalog::new(config.compatibility)));
        let offset_watcher = Arc::new(OffsetWatcher::new());

        let master = MasterCoordinator::start(transport, registry_master::DEFAULT_POLL_INTERVAL);
        let master_status = master.shared_state();

        let (projector_shutdown_tx, projector_shutdown_rx) = oneshot::channel();
        let projector = registry_store::Projector::new(
            bus.clone(),
            catalog.clone(),
            offset_watcher.clone(),
            master_status.clone(),
            config.replication_factor,
        )
        .with_poll_timeout(config.poll_timeout);
        let projector_handle = tokio::spawn(projector.run(projector_shutdown_rx));

        let producer = Arc::new(Producer::new(
            bus,
            offset_watcher,
            config.produce_flush_timeout,
            config.barrier_timeout,
        ));
        let pipeline = RegistrationPipeline::new(catalog.clone(), producer, master_status);

        Ok(SchemaRegistry {
            catalog,
            pipeline,
            master,
            projector_shutdown: Some(projector_shutdown_tx),
            projector_handle: Some(projector_handle),
        })
    }

    /// Whether the projector has caught up to the log offset observed at
    /// startup.
    pub async fn is_ready(&self) -> bool {
        self.catalog.read().await.is_ready()
    }

    /// Register a new schema under `subject`, running reference
    /// resolution and compatibility checking per §4.6.
    pub async fn register(
        &self,
        subject: &SubjectName,
        schema_type: SchemaType,
        text: &str,
        references: Vec<Reference>,
    ) -> RegistryResult<SchemaId> {
        let dependencies = if references.is_empty() {
            None
        } else {
            let catalog = self.catalog.read().await;
            Some(resolve_references(&references, &*catalog)?)
        };

        let parsed = TypedSchema::parse(schema_type, text, ParseMode::Validating, references, dependencies)?;
        self.pipeline.write_new_schema(subject, &parsed).await
    }

    /// Set the default compatibility mode, or a per-subject override when
    /// `subject` is given.
    pub async fn set_compatibility(
        &self,
        subject: Option<&SubjectName>,
        mode: Option<registry_types::CompatibilityMode>,
    ) -> RegistryResult<()> {
        self.pipeline.set_compatibility(subject, mode).await
    }

    /// Soft-delete every version of `subject`.
    pub async fn delete_subject(&self, subject: &SubjectName) -> RegistryResult<Version> {
        self.pipeline.delete_subject(subject).await
    }

    /// Permanently remove a single, already soft-deleted version.
    pub async fn delete_version_permanently(&self, subject: &SubjectName, version: Version) -> RegistryResult<()> {
        self.pipeline.delete_version_permanently(subject, version).await
    }

    /// Look up a schema by id.
    pub async fn schemas_get(&self, id: SchemaId) -> Option<Arc<TypedSchema>> {
        self.catalog.read().await.schemas_get(id)
    }

    /// All (by default, non-deleted) schema entries for `subject`.
    pub async fn get_schemas(&self, subject: &str, include_deleted: bool) -> StoreResult<Vec<SchemaEntry>> {
        self.catalog.read().await.get_schemas(subject, include_deleted)
    }

    /// Resolve a version selector against `subject`.
    pub async fn subject_version_get(
        &self,
        subject: &str,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> StoreResult<SchemaEntry> {
        self.catalog.read().await.subject_version_get(subject, selector, include_deleted)
    }

    /// Every `(subject, version)` pair currently bound to `id`.
    pub async fn get_versions(&self, id: SchemaId) -> Vec<(SubjectName, Version)> {
        self.catalog.read().await.get_versions(id)
    }

    /// Every subject's schema entries, reproducing the `latest_only`
    /// shape quirk (§9) verbatim.
    pub async fn get_schemas_list(&self, include_deleted: bool, latest_only: bool) -> Vec<(SubjectName, SubjectSchemas)> {
        self.catalog.read().await.get_schemas_list(include_deleted, latest_only)
    }

    /// Stop the projector and master-coordinator background tasks.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.projector_shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.projector_handle.take() {
            let _ = handle.await;
        }
        self.master.close().await;
    }
}
