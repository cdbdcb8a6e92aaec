#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **registry-core** – Ties the log-replay projector (C4), master
//! coordinator (C5), registration pipeline (C6), read API (C7), and
//! producer/barrier (C8) together into the top-level [`SchemaRegistry`]
//! facade, plus the configuration and error types shared across them.

mod config;
mod error;
mod pipeline;
mod producer;
mod registry;

pub use config::RegistryConfig;
pub use error::{ConfigError, ConfigResult, RegistryError, RegistryResult};
pub use pipeline::RegistrationPipeline;
pub use producer::Producer;
pub use registry::SchemaRegistry;
