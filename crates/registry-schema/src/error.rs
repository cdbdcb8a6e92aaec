//! Error types for schema parsing, canonicalization and reference resolution.

use registry_types::{SubjectName, Version};
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors surfaced by `registry-schema`.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The parser rejected the submitted text.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A declared reference points nowhere in the catalog, or a cycle was
    /// detected while resolving references.
    #[error("invalid references: {0}")]
    InvalidReferences(String),

    /// A Protobuf import could not be satisfied by the resolved dependency
    /// set.
    #[error("unresolved dependency: {0}")]
    UnresolvedDependency(String),

    /// `to_dict()` was called on a schema type with no JSON shape
    /// (Protobuf).
    #[error("schema type {0:?} has no JSON representation")]
    NoJsonShape(registry_types::SchemaType),
}

impl SchemaError {
    /// Build an `InvalidReferences` error naming the missing edge.
    pub fn missing_reference(subject: &SubjectName, version: Version) -> Self {
        SchemaError::InvalidReferences(format!("no schema in {subject} with version {version}"))
    }

    /// Build an `InvalidReferences` error for a cyclic reference graph.
    pub fn reference_cycle(subject: &SubjectName, version: Version) -> Self {
        SchemaError::InvalidReferences(format!(
            "cyclic reference detected at {subject} version {version}"
        ))
    }
}
