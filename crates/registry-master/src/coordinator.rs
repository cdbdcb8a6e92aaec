//! The master-coordinator background task (C5): polls an
//! [`ElectionTransport`] on an interval and publishes what it learns into
//! a [`SharedMasterState`], mirroring the leader-monitoring task in
//! `distributed_kernel.rs`'s `start_background_tasks`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use registry_types::{MasterState, MasterStatus};

use crate::state::SharedMasterState;
use crate::transport::ElectionTransport;

/// Default interval between polls of the election transport.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running coordinator task. Dropping this without calling [`close`]
/// leaves the background task running until the process exits.
///
/// [`close`]: MasterCoordinator::close
pub struct MasterCoordinator {
    state: Arc<SharedMasterState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MasterCoordinator {
    /// Spawn the polling loop and return a handle plus the shared state
    /// readers should depend on.
    pub fn start<T>(transport: Arc<T>, poll_interval: Duration) -> Self
    where
        T: ElectionTransport + 'static,
    {
        let state = Arc::new(SharedMasterState::new());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task_state = state.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match transport.poll_master().await {
                            Ok((new_state, url)) => {
                                let changed = task_state.master_state() != new_state;
                                task_state.set(new_state, url);
                                if changed {
                                    tracing::info!(?new_state, "master state changed");
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "election transport poll failed");
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("master coordinator task shutting down");
                        break;
                    }
                }
            }
        });

        MasterCoordinator {
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// The shared, synchronously-readable status other components depend
    /// on via `registry_types::MasterStatus`.
    pub fn shared_state(&self) -> Arc<SharedMasterState> {
        self.state.clone()
    }

    /// Stop the background polling task and wait for it to exit.
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
