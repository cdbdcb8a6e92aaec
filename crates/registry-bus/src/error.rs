//! Errors surfaced by the log-bus abstraction.

use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Failures a message-bus client can report (§6, consumed interfaces).
#[derive(Debug, Error)]
pub enum BusError {
    /// No brokers were reachable yet; callers should retry with backoff.
    #[error("no brokers available")]
    NoBrokersAvailable,

    /// A node in the cluster wasn't ready yet; retryable.
    #[error("node not ready")]
    NodeNotReady,

    /// The configured replication factor exceeds available brokers.
    #[error("invalid replication factor")]
    InvalidReplicationFactor,

    /// The bus client was misconfigured; fatal, do not retry.
    #[error("bus configuration error: {0}")]
    Configuration(String),

    /// An operation exceeded its deadline.
    #[error("bus operation timed out")]
    Timeout,

    /// Anything else the bus client reported.
    #[error("bus error: {0}")]
    Other(String),
}

impl BusError {
    /// Whether the startup sequence (C4 §4.4) should retry this error with
    /// backoff rather than treating it as fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BusError::NoBrokersAvailable
                | BusError::NodeNotReady
                | BusError::InvalidReplicationFactor
                | BusError::Timeout
        )
    }

    /// Whether this error should abort the startup sequence immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BusError::Configuration(_))
    }
}
