//! The top-level `RegistryError`, aggregating every per-crate error via
//! `#[from]` the same way the teacher workspace layers `RaftStorageError`
//! over `raft-core::RaftError`.

use thiserror::Error;

use registry_bus::BusError;
use registry_schema::SchemaError;
use registry_store::StoreError;

/// Result type for configuration loading/validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures building or validating a `RegistryConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option was missing or out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Build an `Invalid` variant from any displayable message.
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }
}

/// Result type for top-level registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Every failure the registry facade (C6/C8, wrapping C4/C5/C7) can
/// surface to a caller.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The submitted schema was rejected against `compatibility`, with one
    /// representative message (§4.6 step 3).
    #[error("incompatible schema: {0}")]
    IncompatibleSchema(String),

    /// This replica is not currently master; writes must go to whichever
    /// replica is.
    #[error("this replica is not the master (master_url={master_url:?})")]
    NotMaster {
        /// Advertised URL of the current master, if known.
        master_url: Option<String>,
    },

    /// The replica has not yet caught up to the log offset observed at
    /// startup.
    #[error("replica is not ready")]
    NotReady,

    /// A write was durably appended but the local projection didn't catch
    /// up before the barrier timeout elapsed. Callers must not blindly
    /// retry a timed-out write (duplicate appends change history).
    #[error("timed out waiting for offset {offset} to be folded locally")]
    BarrierTimeout {
        /// Offset the write was assigned.
        offset: i64,
    },

    /// Bus-level failure.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Schema parsing/reference-resolution failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Catalog/read-API failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A wire record failed to serialize. Only reachable if this crate's
    /// own record-building logic constructs a non-serializable value.
    #[error("failed to serialize wire record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    /// Whether a caller may safely retry the operation (mirrors
    /// `RaftStorageError::is_retryable`).
    pub fn is_retryable(&self) -> bool {
        match self {
            RegistryError::Bus(e) => e.is_retryable(),
            RegistryError::NotMaster { .. } | RegistryError::NotReady => true,
            RegistryError::BarrierTimeout { .. } => false,
            _ => false,
        }
    }

    /// Whether this is an input/validation rejection (4xx-equivalent)
    /// rather than an operational failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RegistryError::IncompatibleSchema(_) | RegistryError::Schema(_) | RegistryError::Store(_)
        )
    }
}
