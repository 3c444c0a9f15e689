//! Migration step contracts.
//!
//! One step per adjacent protocol pair (N -> N+1). Both directions are total
//! over every message variant: payloads the step has no rule for are moved
//! across the version boundary with only their type tag changed.

use airbridge_types::protocol::v1::ConfiguredAirbyteCatalog;
use airbridge_types::Version;

use crate::error::Result;
use crate::versioned::{ProtocolModel, VersionedCatalog, VersionedMessage};

/// Upgrades and downgrades messages across one version boundary.
///
/// `catalog` is always the canonical configured catalog; steps that need
/// stream schemas resolve them from it.
pub trait MessageMigration: Send + Sync {
    type Previous: ProtocolModel<Carrier = VersionedMessage>;
    type Current: ProtocolModel<Carrier = VersionedMessage>;

    fn previous_version(&self) -> &Version;

    fn current_version(&self) -> &Version;

    /// # Errors
    ///
    /// Returns a [`ProtocolError`](crate::ProtocolError) data error when the
    /// payload cannot be reconciled with `catalog`.
    fn upgrade(
        &self,
        message: Self::Previous,
        catalog: Option<&ConfiguredAirbyteCatalog>,
    ) -> Result<Self::Current>;

    /// # Errors
    ///
    /// Returns a [`ProtocolError`](crate::ProtocolError) data error when the
    /// payload cannot be reconciled with `catalog`.
    fn downgrade(
        &self,
        message: Self::Current,
        catalog: Option<&ConfiguredAirbyteCatalog>,
    ) -> Result<Self::Previous>;
}

/// Upgrades and downgrades configured catalogs across one version boundary.
pub trait CatalogMigration: Send + Sync {
    type Previous: ProtocolModel<Carrier = VersionedCatalog>;
    type Current: ProtocolModel<Carrier = VersionedCatalog>;

    fn previous_version(&self) -> &Version;

    fn current_version(&self) -> &Version;

    /// # Errors
    ///
    /// Returns a [`ProtocolError`](crate::ProtocolError) when the catalog
    /// cannot be represented at the newer version.
    fn upgrade(&self, catalog: Self::Previous) -> Result<Self::Current>;

    /// # Errors
    ///
    /// Returns a [`ProtocolError`](crate::ProtocolError) when the catalog
    /// cannot be represented at the older version.
    fn downgrade(&self, catalog: Self::Current) -> Result<Self::Previous>;
}

// ---------------------------------------------------------------------------
// Type-erased steps, as stored by a MigrationContainer
// ---------------------------------------------------------------------------

/// Version bounds of a registered step.
pub trait MigrationStep: Send + Sync {
    fn previous_version(&self) -> &Version;
    fn current_version(&self) -> &Version;
}

/// Object-safe form of [`MessageMigration`].
pub trait DynMessageMigration: MigrationStep {
    /// # Errors
    ///
    /// Propagates the step's error, or a version mismatch when `message` is
    /// not at this step's previous version.
    fn upgrade_versioned(
        &self,
        message: VersionedMessage,
        catalog: Option<&ConfiguredAirbyteCatalog>,
    ) -> Result<VersionedMessage>;

    /// # Errors
    ///
    /// Propagates the step's error, or a version mismatch when `message` is
    /// not at this step's current version.
    fn downgrade_versioned(
        &self,
        message: VersionedMessage,
        catalog: Option<&ConfiguredAirbyteCatalog>,
    ) -> Result<VersionedMessage>;
}

/// Object-safe form of [`CatalogMigration`].
pub trait DynCatalogMigration: MigrationStep {
    /// # Errors
    ///
    /// Propagates the step's error, or a version mismatch.
    fn upgrade_versioned(&self, catalog: VersionedCatalog) -> Result<VersionedCatalog>;

    /// # Errors
    ///
    /// Propagates the step's error, or a version mismatch.
    fn downgrade_versioned(&self, catalog: VersionedCatalog) -> Result<VersionedCatalog>;
}

/// Adapts a typed [`MessageMigration`] for storage in a chain.
pub struct MessageStep<M>(pub M);

impl<M: MessageMigration> MigrationStep for MessageStep<M> {
    fn previous_version(&self) -> &Version {
        self.0.previous_version()
    }

    fn current_version(&self) -> &Version {
        self.0.current_version()
    }
}

impl<M: MessageMigration> DynMessageMigration for MessageStep<M> {
    fn upgrade_versioned(
        &self,
        message: VersionedMessage,
        catalog: Option<&ConfiguredAirbyteCatalog>,
    ) -> Result<VersionedMessage> {
        let previous = M::Previous::from_carrier(message)?;
        Ok(self.0.upgrade(previous, catalog)?.into_carrier())
    }

    fn downgrade_versioned(
        &self,
        message: VersionedMessage,
        catalog: Option<&ConfiguredAirbyteCatalog>,
    ) -> Result<VersionedMessage> {
        let current = M::Current::from_carrier(message)?;
        Ok(self.0.downgrade(current, catalog)?.into_carrier())
    }
}

/// Adapts a typed [`CatalogMigration`] for storage in a chain.
pub struct CatalogStep<M>(pub M);

impl<M: CatalogMigration> MigrationStep for CatalogStep<M> {
    fn previous_version(&self) -> &Version {
        self.0.previous_version()
    }

    fn current_version(&self) -> &Version {
        self.0.current_version()
    }
}

impl<M: CatalogMigration> DynCatalogMigration for CatalogStep<M> {
    fn upgrade_versioned(&self, catalog: VersionedCatalog) -> Result<VersionedCatalog> {
        let previous = M::Previous::from_carrier(catalog)?;
        Ok(self.0.upgrade(previous)?.into_carrier())
    }

    fn downgrade_versioned(&self, catalog: VersionedCatalog) -> Result<VersionedCatalog> {
        let current = M::Current::from_carrier(catalog)?;
        Ok(self.0.downgrade(current)?.into_carrier())
    }
}
