//! Catalog row types: `SchemaEntry`, `Subject`, and the per-subject read
//! shape that reproduces the upstream `latest_only` quirk (§9).

use std::collections::BTreeMap;
use std::sync::Arc;

use registry_schema::TypedSchema;
use registry_types::{CompatibilityMode, Reference, SchemaId, Version};

/// A single row in a subject's schema table.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    /// Globally unique schema id.
    pub id: SchemaId,
    /// Version within the owning subject.
    pub version: Version,
    /// The parsed, canonicalized schema.
    pub schema: Arc<TypedSchema>,
    /// Soft-delete flag; a soft-deleted entry stays in the table.
    pub deleted: bool,
    /// Protobuf reference edges declared by this entry, if any.
    pub references: Vec<Reference>,
}

/// Per-subject state: an optional compatibility override and an ordered
/// table of schema versions.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    /// Per-subject compatibility override; `None` defers to the global
    /// default.
    pub compatibility: Option<CompatibilityMode>,
    /// Versions in ascending order.
    pub schemas: BTreeMap<Version, SchemaEntry>,
}

impl Subject {
    /// Non-deleted versions in ascending order.
    pub fn live_versions(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.schemas.values().filter(|e| !e.deleted)
    }

    /// The highest version present, deleted or not.
    pub fn max_version(&self) -> Option<Version> {
        self.schemas.keys().next_back().copied()
    }
}

/// The result shape of a multi-subject schema listing (§4.7,
/// `get_schemas_list`). Reproduces the upstream quirk verbatim: when the
/// caller asks for `latest_only`, the per-subject value is a *single*
/// entry, not a one-element list.
#[derive(Debug, Clone)]
pub enum SubjectSchemas {
    /// `latest_only=false`: every matching entry for the subject.
    List(Vec<SchemaEntry>),
    /// `latest_only=true`: just the most recently inserted entry.
    Single(SchemaEntry),
}
