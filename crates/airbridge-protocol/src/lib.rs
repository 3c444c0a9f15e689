//! Airbyte protocol version migration.
//!
//! Connectors speak whatever protocol major they were built against; the
//! platform works on the canonical version only. This crate owns the steps
//! between adjacent majors, the version-sorted chain that composes them, and
//! per-version line serde.

pub mod codec;
pub mod container;
pub mod error;
pub mod migration;
pub mod migrations;
pub mod migrator;
pub mod versioned;

pub use codec::AirbyteMessageSerDe;
pub use container::MigrationContainer;
pub use error::{MigrationDataError, ProtocolError, Result};
pub use migration::{CatalogMigration, MessageMigration};
pub use migrator::{AirbyteMessageMigrator, ConfiguredCatalogMigrator, VersionedMigrator};
pub use versioned::{ProtocolModel, VersionedCatalog, VersionedMessage};
