//! Canonicalization rules for each schema type.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{SchemaError, SchemaResult};
use registry_types::SchemaType;

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//[^\n]*").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Re-serialize Avro/JSON Schema text with sorted keys. `serde_json`'s
/// default `Map` is a `BTreeMap`, so a plain round-trip through `Value`
/// already yields deterministic key order.
pub fn canonicalize_json_like(text: &str) -> SchemaResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| SchemaError::InvalidSchema(e.to_string()))
}

/// Strip comments and collapse whitespace so that semantically identical
/// `.proto` text compares equal regardless of formatting. Protobuf is
/// treated as an opaque validator (no AST pretty-printer), so this is the
/// closest faithful stand-in for "the parser's deterministic pretty-print".
pub fn normalize_protobuf_text(text: &str) -> String {
    let no_block = BLOCK_COMMENT.replace_all(text, "");
    let no_line = LINE_COMMENT.replace_all(&no_block, "");
    no_line
        .lines()
        .map(|line| WHITESPACE_RUN.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Produce the canonical text for a schema of the given type.
pub fn canonicalize(schema_type: SchemaType, text: &str) -> SchemaResult<String> {
    match schema_type {
        SchemaType::Avro | SchemaType::JsonSchema => canonicalize_json_like(text),
        SchemaType::Protobuf => Ok(normalize_protobuf_text(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn json_like_sorts_keys() {
        let a = canonicalize_json_like(r#"{"b":1,"a":2}"#).unwrap();
        let b = canonicalize_json_like(r#"{"a":2,"b":1}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn protobuf_ignores_comments_and_whitespace() {
        let a = normalize_protobuf_text("message Foo {\n  // a comment\n  string bar = 1;\n}\n");
        let b = normalize_protobuf_text("message   Foo {\nstring bar = 1; /* trailing */\n}");
        assert_eq!(a, b);
    }

    proptest! {
        /// Canonicalizing already-canonical JSON-like text is a fixed
        /// point: re-running it changes nothing further.
        #[test]
        fn canonicalize_json_like_is_idempotent(field in "[a-z]{1,6}", value in 0i32..1000) {
            let text = format!(r#"{{"{field}":{value}}}"#);
            let once = canonicalize_json_like(&text).unwrap();
            let twice = canonicalize_json_like(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
