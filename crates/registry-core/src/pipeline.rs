//! The registration pipeline (C6): validate, check compatibility,
//! assign an id/version, and append — or fast-match an existing id
//! without writing.

use std::sync::Arc;

use tokio::sync::Mutex;

use registry_bus::LogBus;
use registry_schema::{check_compatibility, is_incompatible, TypedSchema};
use registry_store::SharedCatalog;
use registry_types::{MasterState, MasterStatus, SchemaId, SubjectName, Version};

use crate::error::{RegistryError, RegistryResult};
use crate::producer::Producer;

/// Runs the §4.6 algorithm against the shared catalog, serialized by a
/// per-process mutex so id/version assignment is atomic with respect to
/// other writes on this replica.
pub struct RegistrationPipeline<B: LogBus> {
    catalog: SharedCatalog,
    producer: Arc<Producer<B>>,
    master: Arc<dyn MasterStatus>,
    registration_lock: Mutex<()>,
}

impl<B: LogBus> RegistrationPipeline<B> {
    /// Build a pipeline over the shared catalog and producer, gating
    /// writes on `master`'s observed status.
    pub fn new(catalog: SharedCatalog, producer: Arc<Producer<B>>, master: Arc<dyn MasterStatus>) -> Self {
        RegistrationPipeline {
            catalog,
            producer,
            master,
            registration_lock: Mutex::new(()),
        }
    }

    /// Register `new_schema` under `subject`, returning the id it was (or
    /// already is) bound to. The caller must have already resolved any
    /// Protobuf references and parsed `new_schema` in validating mode.
    pub async fn write_new_schema(&self, subject: &SubjectName, new_schema: &TypedSchema) -> RegistryResult<SchemaId> {
        if !matches!(self.master.master_state(), MasterState::Master) {
            return Err(RegistryError::NotMaster {
                master_url: self.master.master_url(),
            });
        }

        let _guard = self.registration_lock.lock().await;

        let catalog = self.catalog.read().await;
        if !catalog.is_ready() {
            return Err(RegistryError::NotReady);
        }

        let live_count = catalog.subject(subject).map(|s| s.live_versions().count()).unwrap_or(0);

        if live_count == 0 {
            let next_version = catalog
                .subject(subject)
                .and_then(|s| s.max_version())
                .map(|v| v + 1)
                .unwrap_or(1);
            let id = catalog.find_id_by_equal_schema(new_schema).unwrap_or_else(|| catalog.next_schema_id());
            drop(catalog);

            self.producer.send_schema_message(subject, next_version, id, new_schema, false).await?;
            return Ok(id);
        }

        let canonical = new_schema.canonical_text();
        if let Some(id) = catalog.fast_match(subject, canonical) {
            return Ok(id);
        }

        let mode = catalog.effective_compatibility(subject);
        let check_set: Vec<Arc<TypedSchema>> = if mode.is_transitive() {
            catalog.subject(subject).unwrap().live_versions().map(|e| e.schema.clone()).collect()
        } else {
            catalog
                .subject(subject)
                .unwrap()
                .live_versions()
                .max_by_key(|e| e.version)
                .map(|e| e.schema.clone())
                .into_iter()
                .collect()
        };

        for old in &check_set {
            let result = check_compatibility(old, new_schema, mode.base_mode());
            if is_incompatible(&result) {
                let message = result.messages.first().cloned().unwrap_or_else(|| "incompatible schema".to_string());
                return Err(RegistryError::IncompatibleSchema(message));
            }
        }

        let id = catalog.find_id_by_equal_schema(new_schema).unwrap_or_else(|| catalog.next_schema_id());
        let version = catalog.subject(subject).unwrap().max_version().unwrap() + 1;
        drop(catalog);

        self.producer.send_schema_message(subject, version, id, new_schema, false).await?;
        Ok(id)
    }

    /// Set the global or per-subject compatibility mode.
    pub async fn set_compatibility(
        &self,
        subject: Option<&SubjectName>,
        mode: Option<registry_types::CompatibilityMode>,
    ) -> RegistryResult<()> {
        if !matches!(self.master.master_state(), MasterState::Master) {
            return Err(RegistryError::NotMaster {
                master_url: self.master.master_url(),
            });
        }
        let _guard = self.registration_lock.lock().await;
        self.producer.send_config_message(subject, mode).await?;
        Ok(())
    }

    /// Soft-delete every version of `subject` up to its current max
    /// version.
    pub async fn delete_subject(&self, subject: &SubjectName) -> RegistryResult<Version> {
        if !matches!(self.master.master_state(), MasterState::Master) {
            return Err(RegistryError::NotMaster {
                master_url: self.master.master_url(),
            });
        }
        let _guard = self.registration_lock.lock().await;

        let catalog = self.catalog.read().await;
        let max_version = catalog
            .subject(subject)
            .and_then(|s| s.max_version())
            .ok_or_else(|| registry_store::StoreError::SubjectNotFound(subject.clone()))?;
        drop(catalog);

        self.producer.send_delete_subject_message(subject, max_version).await?;
        Ok(max_version)
    }

    /// Permanently remove a single version, which must already be
    /// soft-deleted.
    pub async fn delete_version_permanently(&self, subject: &SubjectName, version: Version) -> RegistryResult<()> {
        if !matches!(self.master.master_state(), MasterState::Master) {
            return Err(RegistryError::NotMaster {
                master_url: self.master.master_url(),
            });
        }
        let _guard = self.registration_lock.lock().await;

        let catalog = self.catalog.read().await;
        let entry = catalog
            .subject(subject)
            .and_then(|s| s.schemas.get(&version))
            .ok_or_else(|| registry_store::StoreError::VersionNotFound {
                subject: subject.clone(),
                version,
            })?;
        if !entry.deleted {
            return Err(registry_store::StoreError::VersionNotSoftDeleted {
                subject: subject.clone(),
                version,
            }
            .into());
        }
        drop(catalog);

        self.producer.send_schema_tombstone(subject, version).await?;
        Ok(())
    }
}
