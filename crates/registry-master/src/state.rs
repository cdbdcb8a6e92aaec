//! The shared, synchronously-readable snapshot of master status consumed
//! by the registration pipeline (C6) and projector (C4).

use std::sync::RwLock;

use registry_types::{MasterState, MasterStatus};

/// A `registry_types::MasterStatus` backed by a plain `std::sync::RwLock`
/// so callers can read it without an `await` — the projector and
/// registration pipeline both need a synchronous "am I master right now"
/// check on a hot path.
#[derive(Debug, Default)]
pub struct SharedMasterState {
    inner: RwLock<(MasterState, Option<String>)>,
}

impl SharedMasterState {
    /// A fresh state, unknown until the coordinator task's first poll.
    pub fn new() -> Self {
        SharedMasterState {
            inner: RwLock::new((MasterState::Unknown, None)),
        }
    }

    /// Overwrite the observed state. Called only by the coordinator task.
    pub fn set(&self, state: MasterState, url: Option<String>) {
        let mut guard = self.inner.write().unwrap();
        *guard = (state, url);
    }
}

impl MasterStatus for SharedMasterState {
    fn master_state(&self) -> MasterState {
        self.inner.read().unwrap().0
    }

    fn master_url(&self) -> Option<String> {
        self.inner.read().unwrap().1.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown_and_reflects_updates() {
        let state = SharedMasterState::new();
        assert_eq!(state.master_state(), MasterState::Unknown);

        state.set(MasterState::Master, Some("http://node-1:8081".to_string()));
        assert_eq!(state.master_state(), MasterState::Master);
        assert_eq!(state.master_url().as_deref(), Some("http://node-1:8081"));
    }
}
