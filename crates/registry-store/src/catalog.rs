//! The in-memory projection (C4's target state) and the fold function that
//! applies one log record to it at a time.

use std::collections::HashMap;
use std::sync::Arc;

use registry_bus::LogRecord;
use registry_schema::{resolve_references, ParseMode, ReferenceSource, TypedSchema};
use registry_types::{CompatibilityMode, Offset, Reference, SchemaId, SchemaType, SubjectName, Version};

use crate::entry::{SchemaEntry, Subject};
use crate::error::{StoreError, StoreResult};
use crate::record::{self, KeyMode, KeyType};

/// The process-wide projection folded from the log. Owned exclusively by
/// the projector task (C4); readers (C7) take snapshots through `&Catalog`
/// borrows handed out under the lock the caller wraps this in.
pub struct Catalog {
    schemas_by_id: HashMap<SchemaId, Arc<TypedSchema>>,
    subjects: HashMap<SubjectName, Subject>,
    referenced_by: HashMap<(SubjectName, Version), Vec<SchemaId>>,
    global_schema_id: SchemaId,
    global_compatibility: CompatibilityMode,
    offset: Offset,
    ready: bool,
    key_mode: KeyMode,
    text_intern: HashMap<(SchemaType, String), Arc<TypedSchema>>,
    fast_match: HashMap<(SubjectName, String), SchemaId>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(CompatibilityMode::default())
    }
}

impl Catalog {
    /// An empty catalog, as seen before any record has been folded.
    /// `default_compatibility` seeds the global compatibility mode from
    /// configuration (§6 `compatibility` option) until the first `CONFIG`
    /// record, if any, overrides it.
    pub fn new(default_compatibility: CompatibilityMode) -> Self {
        Catalog {
            schemas_by_id: HashMap::new(),
            subjects: HashMap::new(),
            referenced_by: HashMap::new(),
            global_schema_id: 0,
            global_compatibility: default_compatibility,
            offset: registry_types::OFFSET_UNINITIALIZED,
            ready: false,
            key_mode: KeyMode::default(),
            text_intern: HashMap::new(),
            fast_match: HashMap::new(),
        }
    }

    /// Highest log offset folded so far.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Whether the projector has caught up to the end offset observed at
    /// startup.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The key encoding this replica has latched onto (§10.7).
    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    /// Seed the starting offset from the topic's beginning offset (§4.4
    /// step 4), so that a compacted log whose oldest retained record is
    /// not offset zero doesn't leave the projector waiting to observe
    /// offsets that no longer exist. A no-op once folding has begun.
    pub fn seed_beginning_offset(&mut self, beginning_offset: Offset) {
        if self.offset == registry_types::OFFSET_UNINITIALIZED {
            self.offset = beginning_offset - 1;
        }
    }

    /// Mark readiness once the given snapshot of the topic's end offset
    /// has been reached.
    pub fn mark_ready_if_caught_up(&mut self, end_offset_snapshot: Offset) {
        if !self.ready && self.offset >= end_offset_snapshot - 1 {
            self.ready = true;
        }
    }

    /// The id bound to an existing subject-local canonical text, without
    /// scanning every id (step 2 of the registration algorithm, §4.6).
    pub fn fast_match(&self, subject: &str, canonical_text: &str) -> Option<SchemaId> {
        self.fast_match.get(&(subject.to_string(), canonical_text.to_string())).copied()
    }

    /// Scan `schemas_by_id` for a schema equal to `candidate`, returning
    /// the smallest such id (step 4 of §4.6; across-subject dedup).
    pub fn find_id_by_equal_schema(&self, candidate: &TypedSchema) -> Option<SchemaId> {
        self.schemas_by_id
            .iter()
            .filter(|(_, schema)| schema.as_ref() == candidate)
            .map(|(id, _)| *id)
            .min()
    }

    /// The next id to assign if no equal schema already exists.
    pub fn next_schema_id(&self) -> SchemaId {
        self.global_schema_id + 1
    }

    /// Current high-water mark of locally observed ids.
    pub fn global_schema_id(&self) -> SchemaId {
        self.global_schema_id
    }

    /// Effective compatibility mode for `subject`.
    pub fn effective_compatibility(&self, subject: &str) -> CompatibilityMode {
        self.subjects
            .get(subject)
            .and_then(|s| s.compatibility)
            .unwrap_or(self.global_compatibility)
    }

    /// Borrow a subject's state, if it exists.
    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.get(name)
    }

    /// Names of every known subject.
    pub fn subject_names(&self) -> impl Iterator<Item = &SubjectName> {
        self.subjects.keys()
    }

    /// Look up a schema by id.
    pub fn schema_by_id(&self, id: SchemaId) -> Option<Arc<TypedSchema>> {
        self.schemas_by_id.get(&id).cloned()
    }

    /// Fold one log record into the catalog. Bus-level errors never reach
    /// here; this returns a `StoreError` only for malformed record content,
    /// which callers (the projector) log and skip rather than propagate.
    pub fn apply(&mut self, record: &LogRecord) -> StoreResult<()> {
        let key = record::parse_key(&record.key)?;
        self.key_mode = self.key_mode.observe(&key);

        match key.keytype {
            KeyType::Noop => {}
            KeyType::Config => self.apply_config(&key, record.value.as_deref())?,
            KeyType::DeleteSubject => self.apply_delete_subject(record.value.as_deref())?,
            KeyType::Schema => match &record.value {
                Some(value_bytes) => self.apply_schema_upsert(value_bytes)?,
                None => self.apply_schema_hard_delete(&key)?,
            },
        }

        self.offset = record.offset;
        Ok(())
    }

    fn apply_config(&mut self, key: &record::RecordKey, value: Option<&[u8]>) -> StoreResult<()> {
        let level = match value {
            Some(bytes) => record::parse_config_value(bytes)?.compatibility_level,
            None => None,
        };
        let mode = parse_compatibility_level(level.as_deref());

        match &key.subject {
            None => {
                self.global_compatibility = mode.unwrap_or_default();
                tracing::info!("global compatibility set to {:?}", self.global_compatibility);
            }
            Some(subject) => {
                let entry = self.subjects.entry(subject.clone()).or_default();
                entry.compatibility = mode;
                tracing::info!(%subject, ?mode, "subject compatibility updated");
            }
        }
        Ok(())
    }

    fn apply_schema_upsert(&mut self, value_bytes: &[u8]) -> StoreResult<()> {
        let value = record::parse_schema_value(value_bytes)?;
        let schema_type = SchemaType::from_wire(value.schema_type.as_deref())
            .ok_or_else(|| StoreError::InvalidVersion(format!("unknown schemaType {:?}", value.schema_type)))?;

        let dependencies = if value.references.is_empty() {
            None
        } else {
            Some(resolve_references(&value.references, &*self)?)
        };

        let schema = self.intern_schema(schema_type, &value.schema, &value.references, dependencies)?;

        let subject = self.subjects.entry(value.subject.clone()).or_default();
        subject.schemas.insert(
            value.version,
            SchemaEntry {
                id: value.id,
                version: value.version,
                schema: schema.clone(),
                deleted: value.deleted,
                references: value.references.clone(),
            },
        );

        for reference in &value.references {
            self.referenced_by
                .entry((reference.subject.clone(), reference.version))
                .or_default()
                .push(value.id);
        }

        let canonical_text = schema.canonical_text().to_string();
        self.schemas_by_id.insert(value.id, schema);
        self.global_schema_id = self.global_schema_id.max(value.id);

        let fast_key = (value.subject.clone(), canonical_text);
        if value.deleted {
            self.fast_match.remove(&fast_key);
        } else {
            self.fast_match.insert(fast_key, value.id);
        }

        tracing::debug!(subject = %value.subject, version = value.version, id = value.id, "folded schema record");
        Ok(())
    }

    fn apply_schema_hard_delete(&mut self, key: &record::RecordKey) -> StoreResult<()> {
        let subject_name = key
            .subject
            .clone()
            .ok_or_else(|| StoreError::InvalidVersion("SCHEMA tombstone missing subject".into()))?;
        let version = key
            .version
            .ok_or_else(|| StoreError::InvalidVersion("SCHEMA tombstone missing version".into()))?;

        let mut remove_subject = false;
        if let Some(subject) = self.subjects.get_mut(&subject_name) {
            if let Some(removed) = subject.schemas.remove(&version) {
                let canonical = removed.schema.canonical_text().to_string();
                self.fast_match.remove(&(subject_name.clone(), canonical));
            }
            remove_subject = subject.schemas.is_empty();
        }
        if remove_subject {
            self.subjects.remove(&subject_name);
        }
        self.referenced_by.remove(&(subject_name.clone(), version));
        tracing::info!(subject = %subject_name, version, "hard-deleted schema version");
        Ok(())
    }

    fn apply_delete_subject(&mut self, value: Option<&[u8]>) -> StoreResult<()> {
        let value = value.ok_or_else(|| StoreError::InvalidVersion("DELETE_SUBJECT missing value".into()))?;
        let value = record::parse_delete_subject_value(value)?;

        if let Some(subject) = self.subjects.get_mut(&value.subject) {
            for (version, entry) in subject.schemas.iter_mut() {
                if *version <= value.version {
                    entry.deleted = true;
                }
            }
        }
        self.fast_match.retain(|(subject, _), _| subject != &value.subject);
        tracing::info!(subject = %value.subject, up_to_version = value.version, "subject soft-deleted");
        Ok(())
    }

    fn intern_schema(
        &mut self,
        schema_type: SchemaType,
        text: &str,
        references: &[Reference],
        dependencies: Option<HashMap<String, Arc<TypedSchema>>>,
    ) -> StoreResult<Arc<TypedSchema>> {
        let parsed = TypedSchema::parse(schema_type, text, ParseMode::Lenient, references.to_vec(), dependencies)?;
        let intern_key = (schema_type, parsed.canonical_text().to_string());
        if let Some(existing) = self.text_intern.get(&intern_key) {
            return Ok(existing.clone());
        }
        let arc = Arc::new(parsed);
        self.text_intern.insert(intern_key, arc.clone());
        Ok(arc)
    }
}

impl ReferenceSource for Catalog {
    fn lookup(&self, subject: &SubjectName, version: Version) -> Option<Arc<TypedSchema>> {
        self.subjects.get(subject)?.schemas.get(&version).map(|e| e.schema.clone())
    }
}

fn parse_compatibility_level(level: Option<&str>) -> Option<CompatibilityMode> {
    let level = level?;
    serde_json::from_value(serde_json::Value::String(level.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avro_record(field: &str) -> String {
        format!(r#"{{"type":"record","name":"R","fields":[{{"name":"f","type":"{field}"}}]}}"#)
    }

    fn schema_record(offset: Offset, subject: &str, version: Version, id: u64, text: &str, deleted: bool) -> LogRecord {
        let key = format!(r#"{{"subject":"{subject}","version":{version},"magic":1,"keytype":"SCHEMA"}}"#);
        let value = format!(
            r#"{{"subject":"{subject}","version":{version},"id":{id},"schema":{text},"deleted":{deleted}}}"#,
            text = serde_json::to_string(text).unwrap(),
        );
        LogRecord {
            offset,
            key: key.into_bytes(),
            value: Some(value.into_bytes()),
        }
    }

    fn tombstone(offset: Offset, subject: &str, version: Version) -> LogRecord {
        let key = format!(r#"{{"subject":"{subject}","version":{version},"magic":1,"keytype":"SCHEMA"}}"#);
        LogRecord {
            offset,
            key: key.into_bytes(),
            value: None,
        }
    }

    #[test]
    fn folds_schema_and_binds_id() {
        let mut catalog = Catalog::default();
        let rec = schema_record(0, "s1", 1, 1, &avro_record("string"), false);
        catalog.apply(&rec).unwrap();

        assert_eq!(catalog.offset(), 0);
        assert_eq!(catalog.global_schema_id(), 1);
        assert!(catalog.schema_by_id(1).is_some());
        assert_eq!(catalog.get_schemas("s1", false).unwrap().len(), 1);
    }

    #[test]
    fn dedup_across_subjects_reuses_id() {
        let mut catalog = Catalog::default();
        let text = avro_record("string");
        catalog.apply(&schema_record(0, "s1", 1, 1, &text, false)).unwrap();
        catalog.apply(&schema_record(1, "s2", 1, 1, &text, false)).unwrap();

        let schema = catalog.schema_by_id(1).unwrap();
        assert_eq!(catalog.find_id_by_equal_schema(&schema), Some(1));
        assert_eq!(catalog.fast_match("s2", schema.canonical_text()), Some(1));
    }

    #[test]
    fn delete_subject_soft_deletes_up_to_version() {
        let mut catalog = Catalog::default();
        catalog.apply(&schema_record(0, "s1", 1, 1, &avro_record("string"), false)).unwrap();

        let key = br#"{"subject":"s1","magic":0,"keytype":"DELETE_SUBJECT"}"#.to_vec();
        let value = br#"{"subject":"s1","version":1}"#.to_vec();
        catalog
            .apply(&LogRecord { offset: 1, key, value: Some(value) })
            .unwrap();

        assert!(catalog.get_schemas("s1", false).unwrap().is_empty());
        assert_eq!(catalog.get_schemas("s1", true).unwrap().len(), 1);
        assert!(catalog.schema_by_id(1).is_some());
    }

    #[test]
    fn hard_delete_removes_empty_subject() {
        let mut catalog = Catalog::default();
        catalog.apply(&schema_record(0, "s1", 1, 1, &avro_record("string"), false)).unwrap();
        catalog.apply(&tombstone(1, "s1", 1)).unwrap();

        assert!(catalog.subject("s1").is_none());
    }

    #[test]
    fn malformed_schema_record_is_skipped_without_stopping() {
        let mut catalog = Catalog::default();
        let bad_key = br#"{"subject":"s1","version":1,"magic":1,"keytype":"SCHEMA"}"#.to_vec();
        let bad_value = br#"{"subject":"s1","version":1,"id":1,"schema":"not json","deleted":false}"#.to_vec();
        let bad = LogRecord { offset: 0, key: bad_key, value: Some(bad_value) };
        assert!(catalog.apply(&bad).is_err());
        assert_eq!(catalog.offset(), registry_types::OFFSET_UNINITIALIZED);

        let good = schema_record(1, "s1", 1, 1, &avro_record("string"), false);
        catalog.apply(&good).unwrap();
        assert_eq!(catalog.offset(), 1);
        catalog.mark_ready_if_caught_up(2);
        assert!(catalog.is_ready());
    }

    #[test]
    fn config_record_sets_global_and_subject_compatibility() {
        let mut catalog = Catalog::default();
        let global_key = br#"{"subject":null,"magic":0,"keytype":"CONFIG"}"#.to_vec();
        let global_value = br#"{"compatibilityLevel":"FULL"}"#.to_vec();
        catalog
            .apply(&LogRecord { offset: 0, key: global_key, value: Some(global_value) })
            .unwrap();
        assert_eq!(catalog.effective_compatibility("anything"), CompatibilityMode::Full);

        let subject_key = br#"{"subject":"s1","magic":0,"keytype":"CONFIG"}"#.to_vec();
        let subject_value = br#"{"compatibilityLevel":"NONE"}"#.to_vec();
        catalog
            .apply(&LogRecord { offset: 1, key: subject_key, value: Some(subject_value) })
            .unwrap();
        assert_eq!(catalog.effective_compatibility("s1"), CompatibilityMode::None);
    }
}
