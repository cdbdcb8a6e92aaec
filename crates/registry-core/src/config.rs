//! `RegistryConfig` (§10.3): the recognized options table from §6 plus the
//! timing/concurrency knobs implied by §5, shaped like `RaftClusterConfig`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use registry_types::CompatibilityMode;

use crate::error::{ConfigError, ConfigResult};

/// Configuration for one registry replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Bus (Kafka) bootstrap endpoint.
    pub bootstrap_uri: String,
    /// Name of the single compacted log partition this registry reads.
    pub topic_name: String,
    /// Replication factor used at topic-create time.
    pub replication_factor: u32,
    /// Default compatibility mode applied when a subject has no override.
    pub compatibility: CompatibilityMode,
    /// Bus client session timeout.
    pub session_timeout: Duration,
    /// Bus client metadata refresh interval.
    pub metadata_max_age: Duration,
    /// Bus client idle-connection timeout.
    pub connections_max_idle: Duration,
    /// If false, this replica never accepts writes even if elected master.
    pub master_eligibility: bool,
    /// Election consumer group id.
    pub group_id: String,
    /// Hostname this replica advertises to the election transport.
    pub advertised_hostname: String,
    /// Port this replica advertises to the election transport.
    pub port: u16,
    /// Poll timeout between bus reads (§5 suspension points).
    pub poll_timeout: Duration,
    /// Deadline for a producer's flush before the write is considered
    /// failed (§4.8 step 2).
    pub produce_flush_timeout: Duration,
    /// Deadline for the read-your-writes barrier (§4.8 step 4).
    pub barrier_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            bootstrap_uri: "localhost:9092".to_string(),
            topic_name: "_schemas".to_string(),
            replication_factor: 1,
            compatibility: CompatibilityMode::default(),
            session_timeout: Duration::from_secs(10),
            metadata_max_age: Duration::from_secs(300),
            connections_max_idle: Duration::from_secs(540),
            master_eligibility: true,
            group_id: "schema-registry".to_string(),
            advertised_hostname: "localhost".to_string(),
            port: 8081,
            poll_timeout: registry_store::DEFAULT_POLL_TIMEOUT,
            produce_flush_timeout: Duration::from_secs(10),
            barrier_timeout: Duration::from_secs(60),
        }
    }
}

impl RegistryConfig {
    /// A config with `bootstrap_uri` set, everything else defaulted.
    pub fn new(bootstrap_uri: impl Into<String>) -> Self {
        RegistryConfig {
            bootstrap_uri: bootstrap_uri.into(),
            ..Default::default()
        }
    }

    /// Set the log topic name.
    pub fn with_topic_name(mut self, topic_name: impl Into<String>) -> Self {
        self.topic_name = topic_name.into();
        self
    }

    /// Set the replication factor.
    pub fn with_replication_factor(mut self, replication_factor: u32) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    /// Set the global default compatibility mode.
    pub fn with_compatibility(mut self, compatibility: CompatibilityMode) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// Mark this replica as ineligible to ever hold mastership.
    pub fn with_master_eligibility(mut self, eligible: bool) -> Self {
        self.master_eligibility = eligible;
        self
    }

    /// Validate the configuration, mirroring the shape of
    /// `RaftClusterConfig::validate`.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bootstrap_uri.trim().is_empty() {
            return Err(ConfigError::invalid("bootstrap_uri must not be empty"));
        }
        if self.topic_name.trim().is_empty() {
            return Err(ConfigError::invalid("topic_name must not be empty"));
        }
        if self.replication_factor == 0 {
            return Err(ConfigError::invalid("replication_factor must be at least 1"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("port must be nonzero"));
        }
        Ok(())
    }

    /// Load configuration layered from `config/default` files and the
    /// `REGISTRY_` environment prefix, falling back to defaults for
    /// anything unset. A thin convenience constructor; the core types
    /// above never depend on how configuration was obtained.
    pub fn load() -> ConfigResult<Self> {
        dotenv::dotenv().ok();

        let defaults = RegistryConfig::default();
        let built = config::Config::builder()
            .add_source(config::Config::try_from(&defaults).map_err(|e| ConfigError::invalid(e.to_string()))?)
            .add_source(config::File::with_name("config/registry").required(false))
            .add_source(config::Environment::with_prefix("REGISTRY").separator("__"))
            .build()
            .map_err(|e| ConfigError::invalid(e.to_string()))?;

        let parsed: RegistryConfig = built.try_deserialize().map_err(|e| ConfigError::invalid(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }
}
