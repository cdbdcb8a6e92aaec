#![forbid(unsafe_code)]

//! **registry-cli** – A demo client for local exploration of the registry
//! core: wires a [`MemoryLogBus`] and a [`StaticTransport`] (always master)
//! behind a single [`SchemaRegistry`], since there is no standalone server
//! binary in this workspace.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use registry_bus::MemoryLogBus;
use registry_core::{RegistryConfig, SchemaRegistry};
use registry_master::StaticTransport;
use registry_types::SchemaType;

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Explore a schema registry core backed by an in-memory log")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a schema under a subject
    Register {
        /// Subject name
        subject: String,
        /// Schema type: avro, json, or protobuf
        #[arg(long, default_value = "avro")]
        schema_type: String,
        /// Literal schema text
        schema: String,
    },
    /// Fetch a schema by its global id
    GetSchema {
        /// Schema id
        id: u64,
    },
    /// List every (subject, version) pair currently bound to an id
    GetVersions {
        /// Schema id
        id: u64,
    },
    /// List every subject, optionally including soft-deleted ones
    ListSubjects {
        /// Include soft-deleted subjects
        #[arg(long)]
        include_deleted: bool,
    },
    /// Soft-delete every version of a subject
    DeleteSubject {
        /// Subject name
        subject: String,
    },
}

fn parse_schema_type(raw: &str) -> Result<SchemaType> {
    match raw.to_lowercase().as_str() {
        "avro" => Ok(SchemaType::Avro),
        "json" => Ok(SchemaType::JsonSchema),
        "protobuf" => Ok(SchemaType::Protobuf),
        other => anyhow::bail!("unsupported schema type: {other} (expected avro, json, or protobuf)"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = RegistryConfig::default();
    let bus = Arc::new(MemoryLogBus::new());
    let transport = Arc::new(StaticTransport::always_master("localhost:8081".to_string()));

    let registry = SchemaRegistry::start(config, bus, transport)
        .await
        .context("failed to start registry")?;

    // The projector needs at least one poll cycle to observe the (empty)
    // log and flip to ready; a fresh in-memory bus starts at end offset 0.
    while !registry.is_ready().await {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    match cli.command {
        Commands::Register { subject, schema_type, schema } => {
            let schema_type = parse_schema_type(&schema_type)?;
            let id = registry
                .register(&subject, schema_type, &schema, vec![])
                .await
                .context("registration failed")?;
            println!("registered schema id {id} under subject \"{subject}\"");
        }
        Commands::GetSchema { id } => match registry.schemas_get(id).await {
            Some(schema) => println!("{}", schema.canonical_text()),
            None => println!("schema id {id} not found"),
        },
        Commands::GetVersions { id } => {
            let versions = registry.get_versions(id).await;
            if versions.is_empty() {
                println!("schema id {id} is not bound to any live version");
            }
            for (subject, version) in versions {
                println!("{subject} {version}");
            }
        }
        Commands::ListSubjects { include_deleted } => {
            let subjects = registry.get_schemas_list(include_deleted, true).await;
            for (subject, _) in subjects {
                println!("{subject}");
            }
        }
        Commands::DeleteSubject { subject } => {
            let max_version = registry
                .delete_subject(&subject)
                .await
                .context("delete failed")?;
            println!("soft-deleted \"{subject}\" up to version {max_version}");
        }
    }

    registry.shutdown().await;
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level.to_string()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
