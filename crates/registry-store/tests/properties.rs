//! Property tests for the fold function's quantified invariants: folding
//! is deterministic regardless of batching, and versions assigned to a
//! subject never skip or repeat.

use std::collections::BTreeMap;

use proptest::prelude::*;

use registry_bus::LogRecord;
use registry_store::Catalog;

fn schema_record(offset: i64, subject: &str, version: u32, id: u64, field_name: &str) -> LogRecord {
    let key = serde_json::json!({"subject": subject, "version": version, "magic": 1, "keytype": "SCHEMA"});
    let value = serde_json::json!({
        "subject": subject,
        "version": version,
        "id": id,
        "schema": format!(r#"{{"type":"record","name":"R","fields":[{{"name":"{field_name}","type":"string"}}]}}"#),
        "deleted": false,
    });
    LogRecord {
        offset,
        key: serde_json::to_vec(&key).unwrap(),
        value: Some(serde_json::to_vec(&value).unwrap()),
    }
}

/// A deterministic read-only snapshot of every subject's live versions,
/// used to compare two catalogs folded via different batch splits.
fn snapshot(catalog: &Catalog) -> BTreeMap<String, Vec<(u32, u64)>> {
    let mut out = BTreeMap::new();
    for name in catalog.subject_names() {
        let mut rows: Vec<(u32, u64)> = catalog
            .subject(name)
            .unwrap()
            .live_versions()
            .map(|e| (e.version, e.id))
            .collect();
        rows.sort();
        out.insert(name.clone(), rows);
    }
    out
}

fn replay_all_at_once(records: &[LogRecord]) -> Catalog {
    let mut catalog = Catalog::default();
    for record in records {
        let _ = catalog.apply(record);
    }
    catalog
}

fn replay_in_two_batches(records: &[LogRecord], split: usize) -> Catalog {
    let mut catalog = Catalog::default();
    for record in &records[..split.min(records.len())] {
        let _ = catalog.apply(record);
    }
    for record in &records[split.min(records.len())..] {
        let _ = catalog.apply(record);
    }
    catalog
}

proptest! {
    /// Invariant 1: folding a record list in one pass or split across two
    /// batches at any point produces the same projection.
    #[test]
    fn deterministic_fold_regardless_of_batching(
        subjects in prop::collection::vec("[a-c]", 1..6),
        split in 0usize..10,
    ) {
        let records: Vec<LogRecord> = subjects
            .iter()
            .enumerate()
            .map(|(i, subject)| schema_record(i as i64, subject, (i as u32) + 1, (i as u64) + 1, "f"))
            .collect();

        let whole = snapshot(&replay_all_at_once(&records));
        let split_version = snapshot(&replay_in_two_batches(&records, split));
        prop_assert_eq!(whole, split_version);
    }

    /// Invariant 6: across any sequence of distinct-field registrations to
    /// a single subject via raw wire records, versions assigned in the log
    /// come out as 1, 2, 3, ... with no gaps once folded.
    #[test]
    fn version_assignment_has_no_gaps(count in 1usize..8) {
        let records: Vec<LogRecord> = (0..count)
            .map(|i| schema_record(i as i64, "s1", (i as u32) + 1, (i as u64) + 1, &format!("f{i}")))
            .collect();
        let catalog = replay_all_at_once(&records);
        let versions: Vec<u32> = catalog.subject("s1").unwrap().live_versions().map(|e| e.version).collect();
        let expected: Vec<u32> = (1..=count as u32).collect();
        prop_assert_eq!(versions, expected);
    }
}
