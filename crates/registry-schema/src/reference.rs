//! Reference resolver (C2): walks `(subject, version)` edges to a closed
//! dependency set for Protobuf schemas.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use registry_types::{Reference, SubjectName, Version};

use crate::error::SchemaError;
use crate::typed_schema::TypedSchema;

/// Catalog-side lookup the resolver needs; implemented by the storage
/// crate so this crate never depends on it.
pub trait ReferenceSource {
    /// Look up the (already-registered, already-resolved) schema at
    /// `(subject, version)`.
    fn lookup(&self, subject: &SubjectName, version: Version) -> Option<Arc<TypedSchema>>;
}

/// Resolve `references` against `source`, producing a map from import
/// name to the resolved schema. Recurses into each target's own resolved
/// dependencies to build the closed transitive set, reusing whatever was
/// already memoized on that `TypedSchema` rather than re-resolving it.
///
/// References are forbidden by construction from forming a cycle (they
/// always target a strictly older log offset), but `seen` still guards
/// against one defensively.
pub fn resolve_references(
    references: &[Reference],
    source: &dyn ReferenceSource,
) -> Result<HashMap<String, Arc<TypedSchema>>, SchemaError> {
    let mut seen = HashSet::new();
    let mut out = HashMap::new();
    resolve_into(references, source, &mut seen, &mut out)?;
    Ok(out)
}

fn resolve_into(
    references: &[Reference],
    source: &dyn ReferenceSource,
    seen: &mut HashSet<(SubjectName, Version)>,
    out: &mut HashMap<String, Arc<TypedSchema>>,
) -> Result<(), SchemaError> {
    for reference in references {
        let key = (reference.subject.clone(), reference.version);
        if !seen.insert(key.clone()) {
            return Err(SchemaError::reference_cycle(&reference.subject, reference.version));
        }

        let target = source
            .lookup(&reference.subject, reference.version)
            .ok_or_else(|| SchemaError::missing_reference(&reference.subject, reference.version))?;

        // Reuse whatever the target already resolved (memoization); it was
        // computed when the target itself was registered, strictly earlier
        // in log order.
        if let Some(nested) = target.resolved_dependencies() {
            for (name, schema) in nested {
                out.entry(name.clone()).or_insert_with(|| schema.clone());
            }
        } else {
            resolve_into(target.references(), source, seen, out)?;
        }

        out.insert(reference.name.clone(), target);
        seen.remove(&key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_types::SchemaType;

    struct MapSource(HashMap<(SubjectName, Version), Arc<TypedSchema>>);

    impl ReferenceSource for MapSource {
        fn lookup(&self, subject: &SubjectName, version: Version) -> Option<Arc<TypedSchema>> {
            self.0.get(&(subject.clone(), version)).cloned()
        }
    }

    fn leaf_schema() -> Arc<TypedSchema> {
        Arc::new(
            TypedSchema::parse(
                SchemaType::Protobuf,
                "message Leaf { string a = 1; }",
                crate::typed_schema::ParseMode::Validating,
                vec![],
                None,
            )
            .unwrap(),
        )
    }

    #[test]
    fn resolves_direct_reference() {
        let mut map = HashMap::new();
        map.insert(("common".to_string(), 1), leaf_schema());
        let source = MapSource(map);

        let refs = vec![Reference {
            name: "common.proto".to_string(),
            subject: "common".to_string(),
            version: 1,
        }];

        let resolved = resolve_references(&refs, &source).unwrap();
        assert!(resolved.contains_key("common.proto"));
    }

    #[test]
    fn missing_reference_errors() {
        let source = MapSource(HashMap::new());
        let refs = vec![Reference {
            name: "common.proto".to_string(),
            subject: "common".to_string(),
            version: 1,
        }];
        let err = resolve_references(&refs, &source).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidReferences(_)));
    }
}
