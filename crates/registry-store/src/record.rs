//! Wire record shapes (§4.8) and the dual key-format detector (§10.7).

use registry_types::{Reference, SubjectName, Version};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The `keytype` discriminant carried by every record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    /// Global or per-subject compatibility setting.
    #[serde(rename = "CONFIG")]
    Config,
    /// A schema registration or soft/hard delete.
    #[serde(rename = "SCHEMA")]
    Schema,
    /// A subject-wide soft delete.
    #[serde(rename = "DELETE_SUBJECT")]
    DeleteSubject,
    /// Reserved for offset fencing; carries no state change.
    #[serde(rename = "NOOP")]
    Noop,
}

/// A decoded record key. `subject` is `None` for the global `CONFIG` key;
/// `magic` is present only in the canonical key encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordKey {
    pub keytype: KeyType,
    #[serde(default)]
    pub subject: Option<SubjectName>,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub magic: Option<i64>,
}

/// Which key encoding a replica has observed on the log so far.
///
/// `original_source/karapace/schema_reader.py`'s `handle_messages` latches
/// onto whichever shape the first non-canonical record uses and never
/// flips back, so a replica stays byte-compatible with an older producer
/// for the remainder of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Keys carry the `magic` field (current producers).
    #[default]
    Canonical,
    /// Keys omit `magic` (written by a historical producer).
    Legacy,
}

impl KeyMode {
    /// Whether `key` matches the canonical shape.
    pub fn observe(self, key: &RecordKey) -> KeyMode {
        if self == KeyMode::Legacy {
            return KeyMode::Legacy;
        }
        if key.magic.is_none() {
            KeyMode::Legacy
        } else {
            KeyMode::Canonical
        }
    }
}

/// `CONFIG` record value.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigValue {
    #[serde(rename = "compatibilityLevel", default)]
    pub compatibility_level: Option<String>,
}

/// `SCHEMA` record value (present case; a null value is a hard delete
/// handled by the caller before parsing reaches this struct).
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaValue {
    pub subject: SubjectName,
    pub version: Version,
    pub id: u64,
    pub schema: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(rename = "schemaType", default)]
    pub schema_type: Option<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// `DELETE_SUBJECT` record value.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSubjectValue {
    pub subject: SubjectName,
    pub version: Version,
}

/// Parse a record key from raw JSON bytes.
pub fn parse_key(bytes: &[u8]) -> StoreResult<RecordKey> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::InvalidVersion(e.to_string()))
}

/// Parse a `CONFIG` value.
pub fn parse_config_value(bytes: &[u8]) -> StoreResult<ConfigValue> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::InvalidVersion(e.to_string()))
}

/// Parse a `SCHEMA` value.
pub fn parse_schema_value(bytes: &[u8]) -> StoreResult<SchemaValue> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::InvalidVersion(e.to_string()))
}

/// Parse a `DELETE_SUBJECT` value.
pub fn parse_delete_subject_value(bytes: &[u8]) -> StoreResult<DeleteSubjectValue> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::InvalidVersion(e.to_string()))
}
