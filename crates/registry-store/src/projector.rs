//! The log replay projector (C4): the background task that owns the
//! catalog and is its sole writer.

use std::sync::Arc;
use std::time::Duration;

use registry_bus::{LogBus, LogRecord, OffsetWatcher};
use registry_types::{MasterState, MasterStatus};
use tokio::sync::{oneshot, RwLock};

use crate::catalog::Catalog;

/// Poll timeout used between bus reads while the projector is caught up.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// Bounded backoff applied to a retried startup phase.
const STARTUP_BACKOFF: Duration = Duration::from_millis(500);

/// Shared, lock-guarded catalog handle readers and the registration
/// pipeline take snapshots through.
pub type SharedCatalog = Arc<RwLock<Catalog>>;

/// Runs the startup sequence (§4.4 steps 1-4) then the main fold loop
/// (step 5) until `shutdown` fires.
pub struct Projector<B: LogBus> {
    bus: Arc<B>,
    catalog: SharedCatalog,
    offset_watcher: Arc<OffsetWatcher>,
    master: Arc<dyn MasterStatus>,
    replication_factor: u32,
    poll_timeout: Duration,
}

impl<B: LogBus + 'static> Projector<B> {
    /// Build a projector over `bus`, folding records into `catalog` and
    /// signaling `offset_watcher` once this replica is master.
    pub fn new(
        bus: Arc<B>,
        catalog: SharedCatalog,
        offset_watcher: Arc<OffsetWatcher>,
        master: Arc<dyn MasterStatus>,
        replication_factor: u32,
    ) -> Self {
        Projector {
            bus,
            catalog,
            offset_watcher,
            master,
            replication_factor,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Override the poll timeout between bus reads (default
    /// [`DEFAULT_POLL_TIMEOUT`]).
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Run until `shutdown` resolves. Each startup phase retries
    /// transient bus errors with a bounded backoff; a fatal error aborts
    /// immediately.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            match self.bus.ensure_topic(self.replication_factor).await {
                Ok(()) => break,
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, "fatal error ensuring schema topic, aborting projector");
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "retrying topic creation");
                    tokio::time::sleep(STARTUP_BACKOFF).await;
                }
            }
        }

        let beginning_offset = match self.retry_beginning_offset(&mut shutdown).await {
            Some(o) => o,
            None => return,
        };

        let end_offset_at_startup = match self.retry_end_offset(&mut shutdown).await {
            Some(o) => o,
            None => return,
        };

        {
            let mut catalog = self.catalog.write().await;
            catalog.seed_beginning_offset(beginning_offset);
            catalog.mark_ready_if_caught_up(end_offset_at_startup);
        }

        tracing::info!("projector entering main loop");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("projector received shutdown signal");
                    return;
                }
                records = self.bus.poll(self.poll_timeout) => {
                    match records {
                        Ok(records) => self.fold_batch(records).await,
                        Err(e) => {
                            tracing::warn!(error = %e, "bus poll failed, retrying");
                        }
                    }
                    self.refresh_readiness().await;
                }
            }
        }
    }

    async fn retry_beginning_offset(&self, shutdown: &mut oneshot::Receiver<()>) -> Option<i64> {
        loop {
            tokio::select! {
                _ = &mut *shutdown => return None,
                result = self.bus.beginning_offset() => {
                    match result {
                        Ok(o) => return Some(o),
                        Err(e) if e.is_fatal() => {
                            tracing::error!(error = %e, "fatal error reading beginning offset, aborting projector");
                            return None;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "retrying beginning offset read");
                            tokio::time::sleep(STARTUP_BACKOFF).await;
                        }
                    }
                }
            }
        }
    }

    async fn retry_end_offset(&self, shutdown: &mut oneshot::Receiver<()>) -> Option<i64> {
        loop {
            tokio::select! {
                _ = &mut *shutdown => return None,
                result = self.bus.end_offset() => {
                    match result {
                        Ok(o) => return Some(o),
                        Err(e) if e.is_fatal() => {
                            tracing::error!(error = %e, "fatal error reading end offset, aborting projector");
                            return None;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "retrying end offset read");
                            tokio::time::sleep(STARTUP_BACKOFF).await;
                        }
                    }
                }
            }
        }
    }

    async fn fold_batch(&self, records: Vec<LogRecord>) {
        if records.is_empty() {
            return;
        }
        let is_master = matches!(self.master.master_state(), MasterState::Master);
        let mut catalog = self.catalog.write().await;
        for record in &records {
            let offset = record.offset;
            if let Err(e) = catalog.apply(record) {
                tracing::warn!(offset, error = %e, "skipping malformed record");
                continue;
            }
            if is_master {
                self.offset_watcher.offset_seen(offset);
            }
        }
    }

    async fn refresh_readiness(&self) {
        if let Ok(end_offset) = self.bus.end_offset().await {
            let mut catalog = self.catalog.write().await;
            catalog.mark_ready_if_caught_up(end_offset);
        }
    }
}
