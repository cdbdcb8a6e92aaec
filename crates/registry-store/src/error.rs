//! Errors surfaced by the catalog and the read API over it (C4/C7).

use registry_types::{SchemaId, SubjectName, Version};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures the projection or its read API can report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No subject by this name exists in the catalog.
    #[error("subject not found: {0}")]
    SubjectNotFound(SubjectName),

    /// The subject exists but has no schemas matching the request.
    #[error("no schemas found for subject {0}")]
    SchemasNotFound(SubjectName),

    /// A specific version was requested but is not present.
    #[error("version {version} not found for subject {subject}")]
    VersionNotFound {
        /// Subject queried.
        subject: SubjectName,
        /// Version that was missing.
        version: Version,
    },

    /// No schema is bound to this id.
    #[error("schema id {0} not found")]
    SchemaIdNotFound(SchemaId),

    /// A version selector string did not parse.
    #[error("invalid version selector: {0}")]
    InvalidVersion(String),

    /// The entry exists but hasn't been soft-deleted, so a permanent
    /// delete was rejected.
    #[error("subject {0} is not soft-deleted")]
    SubjectNotSoftDeleted(SubjectName),

    /// The version exists but hasn't been soft-deleted.
    #[error("version {version} of subject {subject} is not soft-deleted")]
    VersionNotSoftDeleted {
        /// Subject queried.
        subject: SubjectName,
        /// Version that was not soft-deleted.
        version: Version,
    },

    /// The version is already soft-deleted; an operation requiring a live
    /// entry was rejected.
    #[error("version {version} of subject {subject} is already soft-deleted")]
    VersionSoftDeleted {
        /// Subject queried.
        subject: SubjectName,
        /// Version that was already soft-deleted.
        version: Version,
    },

    /// Underlying schema parsing/resolution failure while folding a record.
    #[error(transparent)]
    Schema(#[from] registry_schema::SchemaError),
}

impl StoreError {
    /// Whether this is a lookup miss (4xx-equivalent) rather than an
    /// internal inconsistency.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::SubjectNotFound(_)
                | StoreError::SchemasNotFound(_)
                | StoreError::VersionNotFound { .. }
                | StoreError::SchemaIdNotFound(_)
        )
    }
}
