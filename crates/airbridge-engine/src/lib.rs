//! Sync-side protocol handling for Airbridge.
//!
//! Gates connectors on the supported protocol range, adapts their stdout and
//! stdin to the canonical message model, and buffers checkpoints through a
//! state backend.

pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod stream;

// Re-export public API for convenience
pub use checkpoint::SyncPersistence;
pub use errors::SyncError;
pub use gate::{check_connector_protocol, filter_supported, ConnectorDefinition};
pub use stream::{VersionedMessageReader, VersionedMessageWriter};
