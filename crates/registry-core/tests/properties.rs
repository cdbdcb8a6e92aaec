//! Property test for the dedup invariant (§8.3) against the full
//! registration pipeline, not just the catalog fold.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use registry_bus::MemoryLogBus;
use registry_core::RegistryConfig;
use registry_master::StaticTransport;
use registry_types::SchemaType;

fn record_field_schema(field: &str) -> String {
    format!(r#"{{"type":"record","name":"R","fields":[{{"name":"{field}","type":"string"}}]}}"#)
}

proptest! {
    /// Registering the same canonical text under the same subject any
    /// number of times in a row always returns the same id and never
    /// grows the version count past one.
    #[test]
    fn repeated_registration_is_a_no_op(field in "[a-z]{1,8}", repeats in 1usize..5) {
        let schema = record_field_schema(&field);
        let outcome = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let bus = Arc::new(MemoryLogBus::new());
                let transport = Arc::new(StaticTransport::always_master("localhost:8081"));
                let registry = registry_core::SchemaRegistry::start(RegistryConfig::default(), bus, transport)
                    .await
                    .unwrap();
                while !registry.is_ready().await {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }

                let mut ids = Vec::new();
                for _ in 0..repeats {
                    let id = registry
                        .register(&"s1".to_string(), SchemaType::Avro, &schema, vec![])
                        .await
                        .unwrap();
                    ids.push(id);
                }
                let versions = registry.get_versions(ids[0]).await;
                registry.shutdown().await;
                (ids, versions.len())
            });

        let (ids, version_count) = outcome;
        prop_assert!(ids.iter().all(|id| *id == ids[0]));
        prop_assert_eq!(version_count, 1);
    }
}
