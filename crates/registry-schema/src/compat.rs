//! Compatibility checking between two versions of a schema (used by the
//! registration pipeline, C6, step 3).
//!
//! Dispatches on `CompatibilityMode`. The design only specifies a
//! compatibility-check function for Avro and JSON Schema (§6); Protobuf
//! carries no such function and is always reported compatible, matching
//! the narrower external-interface contract rather than inventing one.

use registry_types::CompatibilityMode;
use std::collections::HashSet;

use crate::typed_schema::TypedSchema;

/// Outcome of a single pairwise compatibility check.
#[derive(Debug, Clone)]
pub struct CompatibilityResult {
    /// Whether `new` is compatible with `old` under the checked mode.
    pub compatible: bool,
    /// Human-readable reasons for incompatibility; empty when compatible.
    pub messages: Vec<String>,
}

impl CompatibilityResult {
    fn ok() -> Self {
        CompatibilityResult {
            compatible: true,
            messages: vec![],
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        CompatibilityResult {
            compatible: false,
            messages: vec![message.into()],
        }
    }
}

/// Whether a `CompatibilityResult` represents an incompatible pair.
pub fn is_incompatible(result: &CompatibilityResult) -> bool {
    !result.compatible
}

/// Check `new` against `old` under `mode`. `mode` is expected to already be
/// the base (non-transitive) mode driving the pairwise comparison; the
/// caller (C6) is responsible for iterating the check set for transitive
/// modes.
pub fn check_compatibility(
    old: &TypedSchema,
    new: &TypedSchema,
    mode: CompatibilityMode,
) -> CompatibilityResult {
    if mode == CompatibilityMode::None {
        return CompatibilityResult::ok();
    }

    if old.schema_type() != new.schema_type() {
        return CompatibilityResult::fail(format!(
            "schema type changed from {:?} to {:?}",
            old.schema_type(),
            new.schema_type()
        ));
    }

    match old.schema_type() {
        registry_types::SchemaType::Protobuf => CompatibilityResult::ok(),
        _ => check_record_fields(old, new, mode.base_mode()),
    }
}

fn field_map(schema: &TypedSchema) -> Option<Vec<(String, serde_json::Value, bool)>> {
    let value = schema.to_dict().ok()?;
    let fields = value.get("fields")?.as_array()?;
    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        let name = field.get("name")?.as_str()?.to_string();
        let ty = field.get("type")?.clone();
        let has_default = field.get("default").is_some();
        out.push((name, ty, has_default));
    }
    Some(out)
}

/// Field-level compatibility for record-shaped Avro/JSON schemas: a field
/// whose type changed without a default is a breaking change; a field
/// dropped or added is safe only when the missing side has a default.
fn check_record_fields(
    old: &TypedSchema,
    new: &TypedSchema,
    mode: CompatibilityMode,
) -> CompatibilityResult {
    let (Some(old_fields), Some(new_fields)) = (field_map(old), field_map(new)) else {
        // Non-record shapes (enums, unions, primitives, or schemas we can't
        // introspect as records) are compared by canonical text equality;
        // anything else is beyond what a structural diff can decide here.
        return if old.canonical_text() == new.canonical_text() {
            CompatibilityResult::ok()
        } else {
            CompatibilityResult::fail("non-record schema changed".to_string())
        };
    };

    let old_names: HashSet<&str> = old_fields.iter().map(|(n, _, _)| n.as_str()).collect();
    let new_names: HashSet<&str> = new_fields.iter().map(|(n, _, _)| n.as_str()).collect();

    let check_backward = matches!(mode, CompatibilityMode::Backward | CompatibilityMode::Full);
    let check_forward = matches!(mode, CompatibilityMode::Forward | CompatibilityMode::Full);

    // Fields present in both: a type change breaks both directions.
    for (name, old_ty, _) in &old_fields {
        if let Some((_, new_ty, _)) = new_fields.iter().find(|(n, _, _)| n == name) {
            if old_ty != new_ty {
                return CompatibilityResult::fail(format!(
                    "field '{name}' changed type from {old_ty} to {new_ty}"
                ));
            }
        }
    }

    if check_backward {
        // New schema must be able to read data written with the old one:
        // a field removed in `new` must have had a default in `old`... no,
        // removal is always safe for the reader; a field *added* in `new`
        // must carry a default so old data (lacking it) still parses.
        for (name, _, has_default) in &new_fields {
            if !old_names.contains(name.as_str()) && !has_default {
                return CompatibilityResult::fail(format!(
                    "field '{name}' added without a default breaks backward compatibility"
                ));
            }
        }
    }

    if check_forward {
        // Old schema must be able to read data written with the new one:
        // a field removed in `new` must carry a default in `old` so old
        // readers don't choke on its absence.
        for (name, _, has_default) in &old_fields {
            if !new_names.contains(name.as_str()) && !has_default {
                return CompatibilityResult::fail(format!(
                    "field '{name}' removed without a default breaks forward compatibility"
                ));
            }
        }
    }

    CompatibilityResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed_schema::ParseMode;
    use registry_types::SchemaType;

    fn avro(text: &str) -> TypedSchema {
        TypedSchema::parse(SchemaType::Avro, text, ParseMode::Validating, vec![], None).unwrap()
    }

    #[test]
    fn backward_rejects_type_change() {
        let old = avro(r#"{"type":"record","name":"R","fields":[{"name":"f","type":"string"}]}"#);
        let new = avro(r#"{"type":"record","name":"R","fields":[{"name":"f","type":"int"}]}"#);
        let result = check_compatibility(&old, &new, CompatibilityMode::Backward);
        assert!(is_incompatible(&result));
    }

    #[test]
    fn backward_allows_defaulted_new_field() {
        let old = avro(r#"{"type":"record","name":"R","fields":[{"name":"f","type":"string"}]}"#);
        let new = avro(
            r#"{"type":"record","name":"R","fields":[{"name":"f","type":"string"},{"name":"g","type":"int","default":0}]}"#,
        );
        let result = check_compatibility(&old, &new, CompatibilityMode::Backward);
        assert!(!is_incompatible(&result));
    }

    #[test]
    fn none_mode_always_compatible() {
        let old = avro(r#"{"type":"record","name":"R","fields":[{"name":"f","type":"string"}]}"#);
        let new = avro(r#"{"type":"record","name":"R","fields":[{"name":"f","type":"int"}]}"#);
        let result = check_compatibility(&old, &new, CompatibilityMode::None);
        assert!(!is_incompatible(&result));
    }
}
