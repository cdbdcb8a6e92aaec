//! An in-memory `LogBus`, used by tests, the demo CLI, and property tests
//! that need a real (if non-distributed) log to replay. Modeled on
//! `toka-store-memory`'s `Arc<RwLock<...>>` backend.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use tokio::time::Duration;

use registry_types::Offset;

use crate::error::BusResult;
use crate::log_bus::{LogBus, LogRecord};

/// Single-partition, in-process log. Topic creation is a no-op; records
/// are appended to a `Vec` under a lock. `poll` tracks a single
/// consumer's position, matching the one-projector-per-replica model this
/// core assumes.
#[derive(Default)]
pub struct MemoryLogBus {
    records: RwLock<Vec<LogRecord>>,
    consumer_position: AtomicUsize,
}

impl MemoryLogBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        MemoryLogBus {
            records: RwLock::new(Vec::new()),
            consumer_position: AtomicUsize::new(0),
        }
    }

    /// Number of records currently retained (test/demo helper).
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether the bus currently holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogBus for MemoryLogBus {
    async fn ensure_topic(&self, _replication_factor: u32) -> BusResult<()> {
        Ok(())
    }

    async fn poll(&self, _timeout: Duration) -> BusResult<Vec<LogRecord>> {
        let guard = self.records.read().unwrap();
        let start = self.consumer_position.load(Ordering::SeqCst);
        let batch = guard[start.min(guard.len())..].to_vec();
        self.consumer_position.store(guard.len(), Ordering::SeqCst);
        Ok(batch)
    }

    async fn produce(&self, key: Vec<u8>, value: Option<Vec<u8>>) -> BusResult<Offset> {
        let mut guard = self.records.write().unwrap();
        let offset = guard.len() as Offset;
        guard.push(LogRecord { offset, key, value });
        Ok(offset)
    }

    async fn beginning_offset(&self) -> BusResult<Offset> {
        Ok(0)
    }

    async fn end_offset(&self) -> BusResult<Offset> {
        Ok(self.records.read().unwrap().len() as Offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produce_assigns_increasing_offsets() {
        let bus = MemoryLogBus::new();
        let a = bus.produce(b"k1".to_vec(), Some(b"v1".to_vec())).await.unwrap();
        let b = bus.produce(b"k2".to_vec(), Some(b"v2".to_vec())).await.unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(bus.end_offset().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn poll_returns_all_records_for_the_fake_bus() {
        let bus = MemoryLogBus::new();
        bus.produce(b"k".to_vec(), None).await.unwrap();
        let polled = bus.poll(Duration::from_millis(1)).await.unwrap();
        assert_eq!(polled.len(), 1);
        assert!(polled[0].value.is_none());
    }
}
