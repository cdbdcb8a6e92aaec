//! The message-bus abstraction consumed by the projector (C4) and the
//! producer (C8). The real transport (Kafka) is out of scope; this trait
//! is the seam the core depends on, mirroring the teacher workspace's
//! `StorageBackend`/`EventBus` abstractions.

use async_trait::async_trait;
use registry_types::Offset;
use tokio::time::Duration;

use crate::error::BusResult;

/// A single record read off the log partition. `value` is `None` for a
/// tombstone (hard delete).
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Offset this record was produced at.
    pub offset: Offset,
    /// Raw JSON key bytes.
    pub key: Vec<u8>,
    /// Raw JSON value bytes, or `None` for a tombstone.
    pub value: Option<Vec<u8>>,
}

/// Bus operations the registry core needs. One partition only (§1
/// Non-goals: no multi-partition sharding).
#[async_trait]
pub trait LogBus: Send + Sync {
    /// Ensure the log topic exists with the configured replication
    /// factor and `cleanup.policy=compact`. Already-exists is success.
    async fn ensure_topic(&self, replication_factor: u32) -> BusResult<()>;

    /// Poll for new records, waiting up to `timeout` if none are ready.
    async fn poll(&self, timeout: Duration) -> BusResult<Vec<LogRecord>>;

    /// Append a record and return its assigned offset once durable.
    async fn produce(&self, key: Vec<u8>, value: Option<Vec<u8>>) -> BusResult<Offset>;

    /// The offset of the oldest retained record (after compaction, this
    /// may be greater than zero).
    async fn beginning_offset(&self) -> BusResult<Offset>;

    /// The offset one past the newest record (the next offset that would
    /// be assigned).
    async fn end_offset(&self) -> BusResult<Offset>;
}
