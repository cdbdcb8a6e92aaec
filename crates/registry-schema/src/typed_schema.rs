//! `TypedSchema`: the tagged, immutable value type used everywhere a parsed
//! schema is needed (C1).

use std::collections::HashMap;
use std::sync::Arc;

use registry_types::{Reference, SchemaType};

use crate::canonical::canonicalize;
use crate::error::{SchemaError, SchemaResult};

/// Parsing strictness. New API submissions are validated strictly;
/// replayed log records are parsed leniently because older records may
/// have been written by a more permissive parser and the projection must
/// not reject them (see component design notes on lenient vs validating
/// parsing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Full validation, used for schemas submitted through the API.
    Validating,
    /// Best-effort parsing, used when folding stored log records.
    Lenient,
}

/// A schema together with its type tag, canonical text, and resolved
/// Protobuf dependencies (if any).
///
/// Immutable once constructed; content-addressed equality is defined on
/// `(schema_type, canonical_text, references)`.
#[derive(Debug, Clone)]
pub struct TypedSchema {
    schema_type: SchemaType,
    original_text: String,
    canonical_text: String,
    references: Vec<Reference>,
    resolved_dependencies: Option<HashMap<String, Arc<TypedSchema>>>,
}

impl TypedSchema {
    /// Parse `text` as `schema_type`, validating Avro structurally via its
    /// own parser and treating JSON Schema/Protobuf as opaque validators
    /// beyond a well-formedness check, per the component design.
    pub fn parse(
        schema_type: SchemaType,
        text: &str,
        mode: ParseMode,
        references: Vec<Reference>,
        dependencies: Option<HashMap<String, Arc<TypedSchema>>>,
    ) -> SchemaResult<Self> {
        match schema_type {
            SchemaType::Avro => {
                avro_rs::Schema::parse_str(text)
                    .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
            }
            SchemaType::JsonSchema => {
                let value: serde_json::Value = serde_json::from_str(text)
                    .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
                if mode == ParseMode::Validating && !value.is_object() {
                    return Err(SchemaError::InvalidSchema(
                        "JSON Schema root must be an object".to_string(),
                    ));
                }
            }
            SchemaType::Protobuf => {
                if mode == ParseMode::Validating && text.trim().is_empty() {
                    return Err(SchemaError::InvalidSchema(
                        "protobuf schema text is empty".to_string(),
                    ));
                }
            }
        }

        let canonical_text = canonicalize(schema_type, text)?;

        Ok(TypedSchema {
            schema_type,
            original_text: text.to_string(),
            canonical_text,
            references,
            resolved_dependencies: dependencies,
        })
    }

    /// The schema's type tag.
    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    /// The text exactly as submitted or read from the log.
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// The deterministic canonical string used for equality and dedup.
    pub fn canonical_text(&self) -> &str {
        &self.canonical_text
    }

    /// Declared Protobuf references, empty for Avro/JSON Schema.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Resolved dependency map, present only for Protobuf schemas with
    /// references.
    pub fn resolved_dependencies(&self) -> Option<&HashMap<String, Arc<TypedSchema>>> {
        self.resolved_dependencies.as_ref()
    }

    /// Parse the canonical text back into a JSON value. Fails for
    /// Protobuf, which has no JSON shape.
    pub fn to_dict(&self) -> SchemaResult<serde_json::Value> {
        if self.schema_type == SchemaType::Protobuf {
            return Err(SchemaError::NoJsonShape(self.schema_type));
        }
        serde_json::from_str(&self.canonical_text)
            .map_err(|e| SchemaError::InvalidSchema(e.to_string()))
    }
}

impl PartialEq for TypedSchema {
    fn eq(&self, other: &Self) -> bool {
        self.schema_type == other.schema_type
            && self.canonical_text == other.canonical_text
            && self.references == other.references
    }
}

impl Eq for TypedSchema {}

#[cfg(test)]
mod tests {
    use super::*;

    fn avro_record(field_type: &str) -> String {
        format!(
            r#"{{"type":"record","name":"R","fields":[{{"name":"f","type":"{field_type}"}}]}}"#
        )
    }

    #[test]
    fn parse_and_canonicalize_avro() {
        let schema = TypedSchema::parse(
            SchemaType::Avro,
            &avro_record("string"),
            ParseMode::Validating,
            vec![],
            None,
        )
        .unwrap();
        assert_eq!(schema.schema_type(), SchemaType::Avro);
        assert!(schema.canonical_text().contains("\"fields\""));
    }

    #[test]
    fn equal_text_different_formatting_is_equal() {
        let a = TypedSchema::parse(
            SchemaType::Avro,
            r#"{"type":"record","name":"R","fields":[{"name":"f","type":"string"}]}"#,
            ParseMode::Validating,
            vec![],
            None,
        )
        .unwrap();
        let b = TypedSchema::parse(
            SchemaType::Avro,
            "{\"fields\":[{\"name\":\"f\",\"type\":\"string\"}],\"name\":\"R\",\"type\":\"record\"}",
            ParseMode::Lenient,
            vec![],
            None,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn to_dict_fails_for_protobuf() {
        let schema = TypedSchema::parse(
            SchemaType::Protobuf,
            "message Foo { string bar = 1; }",
            ParseMode::Validating,
            vec![],
            None,
        )
        .unwrap();
        assert!(matches!(schema.to_dict(), Err(SchemaError::NoJsonShape(_))));
    }

    #[test]
    fn invalid_avro_is_rejected() {
        let err = TypedSchema::parse(SchemaType::Avro, "not json", ParseMode::Validating, vec![], None);
        assert!(err.is_err());
    }
}
