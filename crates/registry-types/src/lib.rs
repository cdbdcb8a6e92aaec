#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **registry-types** – Core data model shared across the schema registry.
//!
//! This crate has no I/O and no async dependency: it is the deterministic
//! vocabulary (`SchemaType`, `Reference`, `CompatibilityMode`, …) that every
//! other registry crate builds on.

use serde::{Deserialize, Serialize};

/// Name of a subject, e.g. `"orders-value"`.
pub type SubjectName = String;

/// Positive, strictly increasing per-subject schema version.
pub type Version = u32;

/// Globally unique schema id, monotonically assigned.
pub type SchemaId = u64;

/// Log offset on the single schema-topic partition.
pub type Offset = i64;

/// Offset used to mean "no offset has been read yet".
pub const OFFSET_UNINITIALIZED: Offset = -2;

/// The kind of schema a `TypedSchema` wraps.
///
/// Wire representation omits this field entirely for `Avro` (the historical
/// default) and otherwise serializes as `"JSON"` or `"PROTOBUF"`, matching
/// the upstream `schemaType` value exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaType {
    /// Apache Avro.
    #[serde(rename = "AVRO")]
    Avro,
    /// JSON Schema (Draft 7), wire tag `"JSON"`.
    #[serde(rename = "JSON")]
    JsonSchema,
    /// Protocol Buffers.
    #[serde(rename = "PROTOBUF")]
    Protobuf,
}

impl SchemaType {
    /// Parse the `schemaType` field as found on the wire, where an absent
    /// field means Avro (the historical default).
    pub fn from_wire(value: Option<&str>) -> Option<Self> {
        match value {
            None => Some(SchemaType::Avro),
            Some("AVRO") => Some(SchemaType::Avro),
            Some("JSON") => Some(SchemaType::JsonSchema),
            Some("PROTOBUF") => Some(SchemaType::Protobuf),
            Some(_) => None,
        }
    }

    /// The wire tag to emit, or `None` when the field should be omitted
    /// (Avro, the default).
    pub fn to_wire(self) -> Option<&'static str> {
        match self {
            SchemaType::Avro => None,
            SchemaType::JsonSchema => Some("JSON"),
            SchemaType::Protobuf => Some("PROTOBUF"),
        }
    }
}

/// A Protobuf-only dependency edge: `name` is the import path used inside
/// the referring schema, resolved against `(subject, version)` of another
/// schema already present in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Import path as used in the referring schema's `import` statement.
    pub name: String,
    /// Subject the referenced schema belongs to.
    pub subject: SubjectName,
    /// Version of the referenced schema within that subject.
    pub version: Version,
}

/// Compatibility policy applied when registering a new schema version
/// against a subject's prior versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompatibilityMode {
    /// No compatibility enforcement.
    #[serde(rename = "NONE")]
    None,
    /// New schema can read data written with the immediately prior version.
    #[serde(rename = "BACKWARD")]
    Backward,
    /// Like `Backward`, checked against every prior version.
    #[serde(rename = "BACKWARD_TRANSITIVE")]
    BackwardTransitive,
    /// Prior version can read data written with the new schema.
    #[serde(rename = "FORWARD")]
    Forward,
    /// Like `Forward`, checked against every prior version.
    #[serde(rename = "FORWARD_TRANSITIVE")]
    ForwardTransitive,
    /// Both backward and forward compatible.
    #[serde(rename = "FULL")]
    Full,
    /// Like `Full`, checked against every prior version.
    #[serde(rename = "FULL_TRANSITIVE")]
    FullTransitive,
}

impl CompatibilityMode {
    /// Whether this mode must be checked against every prior non-deleted
    /// version rather than just the latest one.
    pub fn is_transitive(self) -> bool {
        matches!(
            self,
            CompatibilityMode::BackwardTransitive
                | CompatibilityMode::ForwardTransitive
                | CompatibilityMode::FullTransitive
        )
    }

    /// The non-transitive mode driving the same pairwise check, used to
    /// pick the actual schema-vs-schema comparison regardless of whether
    /// it's being run once or transitively.
    pub fn base_mode(self) -> CompatibilityMode {
        match self {
            CompatibilityMode::BackwardTransitive => CompatibilityMode::Backward,
            CompatibilityMode::ForwardTransitive => CompatibilityMode::Forward,
            CompatibilityMode::FullTransitive => CompatibilityMode::Full,
            other => other,
        }
    }
}

impl Default for CompatibilityMode {
    fn default() -> Self {
        CompatibilityMode::Backward
    }
}

/// A version selector accepted by read operations: either a concrete
/// version number or the literal `"latest"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// A specific version number.
    Exact(Version),
    /// The highest version present.
    Latest,
}

impl VersionSelector {
    /// Parse a selector the way the source API accepts it: `"latest"` or a
    /// positive integer string.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "latest" {
            return Some(VersionSelector::Latest);
        }
        let n: Version = raw.parse().ok()?;
        if n == 0 {
            return None;
        }
        Some(VersionSelector::Exact(n))
    }
}

/// Tri-state observation of a replica's master status (§4.5). The
/// election transport is external; only this observable state is used by
/// the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterState {
    /// This replica currently holds mastership and may append writes.
    Master,
    /// This replica is a follower.
    Follower,
    /// Mastership has not been determined yet (e.g. still starting up).
    #[default]
    Unknown,
}

/// The interface the core depends on to gate writes and offset-watcher
/// signaling. Implemented by the master-coordinator crate; named here so
/// that crates which only need to *observe* master status (the projector,
/// the registration pipeline) don't need to depend on the coordinator's
/// transport implementation.
pub trait MasterStatus: Send + Sync {
    /// This replica's current master-election state.
    fn master_state(&self) -> MasterState;
    /// The advertised URL of the current master, if known.
    fn master_url(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_type_wire_roundtrip() {
        assert_eq!(SchemaType::from_wire(None), Some(SchemaType::Avro));
        assert_eq!(SchemaType::from_wire(Some("AVRO")), Some(SchemaType::Avro));
        assert_eq!(SchemaType::from_wire(Some("JSON")), Some(SchemaType::JsonSchema));
        assert_eq!(SchemaType::from_wire(Some("PROTOBUF")), Some(SchemaType::Protobuf));
        assert_eq!(SchemaType::from_wire(Some("XML")), None);

        assert_eq!(SchemaType::Avro.to_wire(), None);
        assert_eq!(SchemaType::JsonSchema.to_wire(), Some("JSON"));
        assert_eq!(SchemaType::Protobuf.to_wire(), Some("PROTOBUF"));
    }

    #[test]
    fn compatibility_mode_transitive() {
        assert!(CompatibilityMode::BackwardTransitive.is_transitive());
        assert!(!CompatibilityMode::Backward.is_transitive());
        assert_eq!(CompatibilityMode::FullTransitive.base_mode(), CompatibilityMode::Full);
        assert_eq!(CompatibilityMode::Backward.base_mode(), CompatibilityMode::Backward);
    }

    #[test]
    fn version_selector_parse() {
        assert_eq!(VersionSelector::parse("latest"), Some(VersionSelector::Latest));
        assert_eq!(VersionSelector::parse("3"), Some(VersionSelector::Exact(3)));
        assert_eq!(VersionSelector::parse("0"), None);
        assert_eq!(VersionSelector::parse("abc"), None);
    }
}
