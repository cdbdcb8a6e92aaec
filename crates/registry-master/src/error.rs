//! Errors surfaced while polling the external election transport.

use thiserror::Error;

/// Result type for master-coordinator operations.
pub type MasterResult<T> = Result<T, MasterError>;

/// Failures the election transport can report (§4.5/§6).
#[derive(Debug, Error)]
pub enum MasterError {
    /// The transport could not be reached; retryable.
    #[error("election transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The transport reported a malformed or contradictory result.
    #[error("election transport returned an invalid result: {0}")]
    InvalidResult(String),
}

impl MasterError {
    /// Whether the polling loop should keep retrying rather than give up.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MasterError::TransportUnavailable(_))
    }
}
