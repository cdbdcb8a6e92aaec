//! Producer + barrier (C8): append a record to the log, then block until
//! its offset has been folded into the local projection.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use registry_bus::{BusError, LogBus, OffsetWatcher};
use registry_schema::TypedSchema;
use registry_types::{CompatibilityMode, Offset, SubjectName, Version};

use crate::error::{RegistryError, RegistryResult};

/// Appends records to the log and enforces read-your-writes before
/// returning to the caller.
pub struct Producer<B: LogBus> {
    bus: Arc<B>,
    offset_watcher: Arc<OffsetWatcher>,
    produce_flush_timeout: Duration,
    barrier_timeout: Duration,
}

impl<B: LogBus> Producer<B> {
    /// Build a producer over `bus`, enforcing the barrier via
    /// `offset_watcher`.
    pub fn new(
        bus: Arc<B>,
        offset_watcher: Arc<OffsetWatcher>,
        produce_flush_timeout: Duration,
        barrier_timeout: Duration,
    ) -> Self {
        Producer {
            bus,
            offset_watcher,
            produce_flush_timeout,
            barrier_timeout,
        }
    }

    /// Append a `SCHEMA` record registering or updating `(subject,
    /// version)`.
    pub async fn send_schema_message(
        &self,
        subject: &SubjectName,
        version: Version,
        id: u64,
        schema: &TypedSchema,
        deleted: bool,
    ) -> RegistryResult<Offset> {
        let key = json!({"subject": subject, "version": version, "magic": 1, "keytype": "SCHEMA"});

        let mut value = serde_json::Map::new();
        value.insert("subject".to_string(), json!(subject));
        value.insert("version".to_string(), json!(version));
        value.insert("id".to_string(), json!(id));
        value.insert("schema".to_string(), json!(schema.canonical_text()));
        value.insert("deleted".to_string(), json!(deleted));
        if let Some(wire_type) = schema.schema_type().to_wire() {
            value.insert("schemaType".to_string(), json!(wire_type));
        }
        if !schema.references().is_empty() {
            value.insert("references".to_string(), json!(schema.references()));
        }

        self.send(key, Some(serde_json::Value::Object(value))).await
    }

    /// Append a `SCHEMA` tombstone (null value) hard-deleting `(subject,
    /// version)`.
    pub async fn send_schema_tombstone(&self, subject: &SubjectName, version: Version) -> RegistryResult<Offset> {
        let key = json!({"subject": subject, "version": version, "magic": 1, "keytype": "SCHEMA"});
        self.send(key, None).await
    }

    /// Append a `CONFIG` record. `subject: None` targets the global
    /// default; `level: None` clears the setting.
    pub async fn send_config_message(
        &self,
        subject: Option<&SubjectName>,
        level: Option<CompatibilityMode>,
    ) -> RegistryResult<Offset> {
        let key = json!({"subject": subject, "magic": 0, "keytype": "CONFIG"});
        let value = level.map(|level| json!({"compatibilityLevel": level}));
        self.send(key, value).await
    }

    /// Append a `DELETE_SUBJECT` record soft-deleting every version up to
    /// and including `max_version`.
    pub async fn send_delete_subject_message(
        &self,
        subject: &SubjectName,
        max_version: Version,
    ) -> RegistryResult<Offset> {
        let key = json!({"subject": subject, "magic": 0, "keytype": "DELETE_SUBJECT"});
        let value = json!({"subject": subject, "version": max_version});
        self.send(key, Some(value)).await
    }

    async fn send(&self, key: serde_json::Value, value: Option<serde_json::Value>) -> RegistryResult<Offset> {
        let key_bytes = serde_json::to_vec(&key)?;
        let value_bytes = match value {
            Some(v) => Some(serde_json::to_vec(&v)?),
            None => None,
        };

        let offset = timeout(self.produce_flush_timeout, self.bus.produce(key_bytes, value_bytes))
            .await
            .map_err(|_| RegistryError::Bus(BusError::Timeout))??;

        if !self.offset_watcher.wait_for_offset(offset, self.barrier_timeout).await {
            return Err(RegistryError::BarrierTimeout { offset });
        }

        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_bus::MemoryLogBus;
    use registry_schema::ParseMode;
    use registry_types::SchemaType;

    #[tokio::test]
    async fn schema_message_round_trips_through_the_bus() {
        let bus = Arc::new(MemoryLogBus::new());
        let watcher = Arc::new(OffsetWatcher::new());
        let producer = Producer::new(bus.clone(), watcher.clone(), Duration::from_secs(1), Duration::from_millis(100));

        // Nothing ever signals the watcher in this test, so the barrier
        // must time out even though the record is durable in the bus.
        let schema = TypedSchema::parse(
            SchemaType::Avro,
            r#"{"type":"record","name":"R","fields":[]}"#,
            ParseMode::Validating,
            vec![],
            None,
        )
        .unwrap();

        let result = producer.send_schema_message(&"s1".to_string(), 1, 1, &schema, false).await;
        assert!(matches!(result, Err(RegistryError::BarrierTimeout { offset: 0 })));
        assert_eq!(bus.len(), 1);
    }

    #[tokio::test]
    async fn barrier_is_satisfied_once_watcher_observes_the_offset() {
        let bus = Arc::new(MemoryLogBus::new());
        let watcher = Arc::new(OffsetWatcher::new());
        let producer = Producer::new(bus, watcher.clone(), Duration::from_secs(1), Duration::from_secs(1));

        let w = watcher.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            w.offset_seen(0);
        });

        let offset = producer
            .send_delete_subject_message(&"s1".to_string(), 3)
            .await
            .unwrap();
        assert_eq!(offset, 0);
    }
}
