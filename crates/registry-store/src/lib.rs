#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **registry-store** – The log replay projector (C4) and the read API
//! over its projection (C7): the catalog of subjects, schemas, and
//! reference edges folded from the schema-topic log.

mod catalog;
mod entry;
mod error;
mod projector;
mod reader;
mod record;

pub use catalog::Catalog;
pub use entry::{SchemaEntry, Subject, SubjectSchemas};
pub use error::{StoreError, StoreResult};
pub use projector::{Projector, SharedCatalog, DEFAULT_POLL_TIMEOUT};
pub use record::{ConfigValue, DeleteSubjectValue, KeyMode, KeyType, RecordKey, SchemaValue};
