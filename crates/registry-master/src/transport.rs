//! The election transport seam (§4.5/§6): only its observable state is
//! used by the core, never its internal protocol.

use async_trait::async_trait;

use registry_types::MasterState;

use crate::error::MasterResult;

/// What the core needs from the external leader election, mirroring
/// `original_source/karapace/schema_registry.py`'s `get_master()` polling
/// loop: ask the transport for the current state, on every tick.
#[async_trait]
pub trait ElectionTransport: Send + Sync {
    /// Poll the transport for the current master state and, if known, the
    /// advertised URL of whoever holds it.
    async fn poll_master(&self) -> MasterResult<(MasterState, Option<String>)>;
}

/// A transport that never changes: useful for single-node demos (the CLI)
/// and for tests that don't exercise leadership changes.
pub struct StaticTransport {
    state: MasterState,
    url: Option<String>,
}

impl StaticTransport {
    /// A transport that always reports this replica as master.
    pub fn always_master(url: impl Into<String>) -> Self {
        StaticTransport {
            state: MasterState::Master,
            url: Some(url.into()),
        }
    }

    /// A transport that always reports this replica as a follower of
    /// `master_url`.
    pub fn always_follower(master_url: impl Into<String>) -> Self {
        StaticTransport {
            state: MasterState::Follower,
            url: Some(master_url.into()),
        }
    }
}

#[async_trait]
impl ElectionTransport for StaticTransport {
    async fn poll_master(&self) -> MasterResult<(MasterState, Option<String>)> {
        Ok((self.state, self.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_transport_always_master_reports_master() {
        let transport = StaticTransport::always_master("http://node-1:8081");
        let (state, url) = transport.poll_master().await.unwrap();
        assert_eq!(state, MasterState::Master);
        assert_eq!(url.as_deref(), Some("http://node-1:8081"));
    }
}
