//! Concrete migration steps, one module per target major.

mod v1;

pub use v1::{AirbyteMessageMigrationV1, ConfiguredCatalogMigrationV1};

use crate::migration::{CatalogStep, DynCatalogMigration, DynMessageMigration, MessageStep};

/// Every message migration this build ships with.
#[must_use]
pub fn message_migrations() -> Vec<Box<dyn DynMessageMigration>> {
    vec![Box::new(MessageStep(AirbyteMessageMigrationV1::default()))]
}

/// Every configured-catalog migration this build ships with.
#[must_use]
pub fn catalog_migrations() -> Vec<Box<dyn DynCatalogMigration>> {
    vec![Box::new(CatalogStep(ConfiguredCatalogMigrationV1::default()))]
}
