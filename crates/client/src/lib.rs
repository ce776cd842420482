// flame-client: request manager for the project browsing and search service.
//
// `ApiClient` is the typed entry point handed to consumers. Every call goes
// through `RequestManager`, which enforces one concurrency policy per
// operation class (coalesce-and-wait for reads, cancel-previous for queries)
// on top of an injectable `Transport`.

pub mod api;
pub mod config;
pub mod fault;
pub mod inflight;
pub mod manager;
pub mod operation;
pub mod payload;
pub mod transport;

pub use api::ApiClient;
pub use config::{ClientConfig, Endpoint};
pub use fault::{Fault, FaultKind};
pub use manager::{Pending, RequestManager};
pub use operation::{InFlightKey, Operation, OperationKind, Policy};
pub use payload::Payload;
pub use transport::{Transport, TransportError};

pub use flame_common::types::{DirectoryEntry, FileContents, LineMatch, SearchItem, SearchResult};
