//! Read API over the projection (C7). All operations are snapshot reads;
//! callers obtain a `&Catalog` through whatever lock guard wraps it.

use registry_schema::TypedSchema;
use registry_types::{SchemaId, SubjectName, Version, VersionSelector};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::entry::{SchemaEntry, SubjectSchemas};
use crate::error::{StoreError, StoreResult};

impl Catalog {
    /// Look up a schema by its globally unique id, regardless of which
    /// subject(s) reference it or whether those entries are deleted.
    pub fn schemas_get(&self, id: SchemaId) -> Option<Arc<TypedSchema>> {
        self.schema_by_id(id)
    }

    /// All versions of `subject`, filtering out soft-deleted entries
    /// unless `include_deleted` is set.
    pub fn get_schemas(&self, subject: &str, include_deleted: bool) -> StoreResult<Vec<SchemaEntry>> {
        let s = self
            .subject(subject)
            .ok_or_else(|| StoreError::SubjectNotFound(subject.to_string()))?;
        let entries: Vec<SchemaEntry> = s
            .schemas
            .values()
            .filter(|e| include_deleted || !e.deleted)
            .cloned()
            .collect();
        Ok(entries)
    }

    /// Resolve a version selector against `subject`.
    pub fn subject_version_get(
        &self,
        subject: &str,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> StoreResult<SchemaEntry> {
        let s = self
            .subject(subject)
            .ok_or_else(|| StoreError::SubjectNotFound(subject.to_string()))?;

        let version = match selector {
            VersionSelector::Exact(v) => v,
            VersionSelector::Latest => s
                .schemas
                .values()
                .filter(|e| include_deleted || !e.deleted)
                .map(|e| e.version)
                .max()
                .ok_or_else(|| StoreError::SchemasNotFound(subject.to_string()))?,
        };

        let entry = s.schemas.get(&version).ok_or_else(|| StoreError::VersionNotFound {
            subject: subject.to_string(),
            version,
        })?;

        if entry.deleted && !include_deleted {
            return Err(StoreError::VersionNotFound {
                subject: subject.to_string(),
                version,
            });
        }
        Ok(entry.clone())
    }

    /// Every `(subject, version)` pair that currently has a non-deleted
    /// entry bound to `id`.
    pub fn get_versions(&self, id: SchemaId) -> Vec<(SubjectName, Version)> {
        let mut out: Vec<(SubjectName, Version)> = self
            .subject_names()
            .filter_map(|name| {
                let subject = self.subject(name)?;
                let hit = subject.live_versions().find(|e| e.id == id)?;
                Some((name.clone(), hit.version))
            })
            .collect();
        out.sort();
        out
    }

    /// Every subject's schema entries. When `latest_only` is set, the
    /// per-subject value is the single most recently inserted entry,
    /// reproducing the upstream shape verbatim (§9).
    pub fn get_schemas_list(
        &self,
        include_deleted: bool,
        latest_only: bool,
    ) -> Vec<(SubjectName, SubjectSchemas)> {
        let mut out = Vec::new();
        for name in self.subject_names() {
            let Some(subject) = self.subject(name) else { continue };
            let mut entries: Vec<SchemaEntry> = subject
                .schemas
                .values()
                .filter(|e| include_deleted || !e.deleted)
                .cloned()
                .collect();
            if entries.is_empty() {
                continue;
            }
            if latest_only {
                // Last by insertion order within the BTreeMap iteration
                // (ascending version) mirrors the source's "last seen"
                // semantics, since versions are assigned in log order.
                let last = entries.pop().unwrap();
                out.push((name.clone(), SubjectSchemas::Single(last)));
            } else {
                out.push((name.clone(), SubjectSchemas::List(entries)));
            }
        }
        out
    }
}
