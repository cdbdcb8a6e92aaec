#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **registry-master** – The master-coordinator interface (C5): the
//! core's view of an externally-run leader election. Only the
//! transport's *observable state* is used, never its internal protocol,
//! matching the component design's stated boundary.

mod coordinator;
mod error;
mod state;
mod transport;

pub use coordinator::{MasterCoordinator, DEFAULT_POLL_INTERVAL};
pub use error::{MasterError, MasterResult};
pub use state::SharedMasterState;
pub use transport::{ElectionTransport, StaticTransport};
