//! Chain-level migrators built on [`MigrationContainer`].
//!
//! The rest of the platform is written against the canonical (V1) models.
//! These types move connector traffic to and from that version.

use std::sync::Arc;

use airbridge_types::protocol::v1;
use airbridge_types::Version;

use crate::container::MigrationContainer;
use crate::error::Result;
use crate::migration::{DynCatalogMigration, DynMessageMigration};
use crate::migrations;
use crate::versioned::{ProtocolModel, VersionedCatalog, VersionedMessage};

/// Migrates [`VersionedMessage`]s between any registered version and the
/// canonical one. Immutable after construction and safe to share.
pub struct AirbyteMessageMigrator {
    container: MigrationContainer<dyn DynMessageMigration>,
}

impl AirbyteMessageMigrator {
    /// # Errors
    ///
    /// Returns a [`ProtocolError`](crate::ProtocolError) when `steps` do not
    /// form a contiguous chain.
    pub fn new(steps: Vec<Box<dyn DynMessageMigration>>) -> Result<Self> {
        Ok(Self {
            container: MigrationContainer::new(steps)?,
        })
    }

    /// Migrator over every step shipped with this crate.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in steps are inconsistent.
    pub fn standard() -> Result<Self> {
        Self::new(migrations::message_migrations())
    }

    #[must_use]
    pub fn most_recent_version(&self) -> Option<&Version> {
        self.container.most_recent_version()
    }

    /// Whether traffic at `version` goes through at least one step.
    #[must_use]
    pub fn needs_migration(&self, version: &Version) -> bool {
        self.container.needs_migration(version)
    }

    /// Move `message`, declared at `source`, up to the canonical version.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnsupportedVersion`](crate::ProtocolError::UnsupportedVersion)
    /// when no path exists; a data error when a step rejects the payload.
    pub fn upgrade(
        &self,
        message: VersionedMessage,
        source: &Version,
        catalog: Option<&v1::ConfiguredAirbyteCatalog>,
    ) -> Result<VersionedMessage> {
        self.container
            .upgrade(message, source, |step, msg| step.upgrade_versioned(msg, catalog))
    }

    /// [`upgrade`](Self::upgrade), unwrapped to the canonical model.
    ///
    /// # Errors
    ///
    /// As [`upgrade`](Self::upgrade), plus a version mismatch when the chain's
    /// canonical version is not V1.
    pub fn upgrade_to_canonical(
        &self,
        message: VersionedMessage,
        source: &Version,
        catalog: Option<&v1::ConfiguredAirbyteCatalog>,
    ) -> Result<v1::AirbyteMessage> {
        v1::AirbyteMessage::from_carrier(self.upgrade(message, source, catalog)?)
    }

    /// Move a canonical `message` down to `target`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnsupportedVersion`](crate::ProtocolError::UnsupportedVersion)
    /// when no path exists; a data error when a step rejects the payload.
    pub fn downgrade(
        &self,
        message: v1::AirbyteMessage,
        target: &Version,
        catalog: Option<&v1::ConfiguredAirbyteCatalog>,
    ) -> Result<VersionedMessage> {
        self.container.downgrade(message.into_carrier(), target, |step, msg| {
            step.downgrade_versioned(msg, catalog)
        })
    }
}

/// Migrates configured catalogs so one can be handed to a connector at its
/// native protocol version.
pub struct ConfiguredCatalogMigrator {
    container: MigrationContainer<dyn DynCatalogMigration>,
}

impl ConfiguredCatalogMigrator {
    /// # Errors
    ///
    /// Returns a [`ProtocolError`](crate::ProtocolError) when `steps` do not
    /// form a contiguous chain.
    pub fn new(steps: Vec<Box<dyn DynCatalogMigration>>) -> Result<Self> {
        Ok(Self {
            container: MigrationContainer::new(steps)?,
        })
    }

    /// # Errors
    ///
    /// Fails only if the built-in steps are inconsistent.
    pub fn standard() -> Result<Self> {
        Self::new(migrations::catalog_migrations())
    }

    #[must_use]
    pub fn most_recent_version(&self) -> Option<&Version> {
        self.container.most_recent_version()
    }

    /// # Errors
    ///
    /// Unsupported version, or a step failure.
    pub fn upgrade(&self, catalog: VersionedCatalog, source: &Version) -> Result<v1::ConfiguredAirbyteCatalog> {
        let upgraded = self
            .container
            .upgrade(catalog, source, |step, c| step.upgrade_versioned(c))?;
        v1::ConfiguredAirbyteCatalog::from_carrier(upgraded)
    }

    /// # Errors
    ///
    /// Unsupported version, or a step failure.
    pub fn downgrade(&self, catalog: v1::ConfiguredAirbyteCatalog, target: &Version) -> Result<VersionedCatalog> {
        self.container
            .downgrade(catalog.into_carrier(), target, |step, c| step.downgrade_versioned(c))
    }
}

/// A message migrator bound to one connector's protocol version.
#[derive(Clone)]
pub struct VersionedMigrator {
    migrator: Arc<AirbyteMessageMigrator>,
    version: Version,
}

impl VersionedMigrator {
    #[must_use]
    pub fn new(migrator: Arc<AirbyteMessageMigrator>, version: Version) -> Self {
        Self { migrator, version }
    }

    /// Same chain, bound to another version.
    #[must_use]
    pub fn with_version(self, version: Version) -> Self {
        Self { version, ..self }
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    #[must_use]
    pub fn canonical_version(&self) -> Option<&Version> {
        self.migrator.most_recent_version()
    }

    #[must_use]
    pub fn needs_migration(&self) -> bool {
        self.migrator.needs_migration(&self.version)
    }

    /// # Errors
    ///
    /// See [`AirbyteMessageMigrator::upgrade_to_canonical`].
    pub fn upgrade(
        &self,
        message: VersionedMessage,
        catalog: Option<&v1::ConfiguredAirbyteCatalog>,
    ) -> Result<v1::AirbyteMessage> {
        self.migrator.upgrade_to_canonical(message, &self.version, catalog)
    }

    /// # Errors
    ///
    /// See [`AirbyteMessageMigrator::downgrade`].
    pub fn downgrade(
        &self,
        message: v1::AirbyteMessage,
        catalog: Option<&v1::ConfiguredAirbyteCatalog>,
    ) -> Result<VersionedMessage> {
        self.migrator.downgrade(message, &self.version, catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airbridge_types::protocol::{v0, DestinationSyncMode, SyncMode};
    use airbridge_types::version::{PROTOCOL_V0, PROTOCOL_V1};
    use serde_json::json;

    use crate::error::ProtocolError;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn v0_record() -> VersionedMessage {
        VersionedMessage::V0(
            serde_json::from_value::<v0::AirbyteMessage>(json!({
                "type": "RECORD",
                "record": {"stream": "users", "data": {"id": 1}, "emitted_at": 5}
            }))
            .unwrap(),
        )
    }

    #[test]
    fn standard_chain_is_canonical_v1() {
        let migrator = AirbyteMessageMigrator::standard().unwrap();
        assert_eq!(migrator.most_recent_version(), Some(&*PROTOCOL_V1));
        let catalogs = ConfiguredCatalogMigrator::standard().unwrap();
        assert_eq!(catalogs.most_recent_version(), Some(&*PROTOCOL_V1));
    }

    #[test]
    fn upgrades_default_version_traffic() {
        let migrator = AirbyteMessageMigrator::standard().unwrap();
        let upgraded = migrator.upgrade_to_canonical(v0_record(), &v("0.2.0"), None).unwrap();
        let v1::AirbyteMessage::Record { record: Some(record) } = upgraded else {
            panic!("expected a record");
        };
        assert_eq!(record.stream, "users");
        assert_eq!(record.data, json!({"id": 1}));
    }

    #[test]
    fn canonical_and_dev_traffic_is_untouched() {
        let migrator = AirbyteMessageMigrator::standard().unwrap();
        let msg = v1::AirbyteMessage::Catalog { catalog: None };
        for version in [v("1.0.0"), v("1.7.2"), v("dev")] {
            let out = migrator.downgrade(msg.clone(), &version, None).unwrap();
            assert_eq!(out, VersionedMessage::V1(msg.clone()));
        }
    }

    #[test]
    fn downgrade_then_upgrade_round_trips() {
        let migrator = AirbyteMessageMigrator::standard().unwrap();
        let original = v1::AirbyteMessage::record(v1::AirbyteRecordMessage::new("users", Some("public"), json!({"a": [1, 2]}), 9));
        let down = migrator.downgrade(original.clone(), &PROTOCOL_V0, None).unwrap();
        assert_eq!(down.protocol_major(), 0);
        let up = migrator.upgrade_to_canonical(down, &PROTOCOL_V0, None).unwrap();
        assert_eq!(up, original);
    }

    #[test]
    fn unknown_major_is_unsupported_not_data() {
        let migrator = AirbyteMessageMigrator::standard().unwrap();
        let err = migrator.upgrade(v0_record(), &v("2.0.0"), None).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedVersion { .. }));
        assert!(!err.is_data_error());
    }

    #[test]
    fn catalog_migrator_downgrades_for_v0_connectors() {
        let migrator = ConfiguredCatalogMigrator::standard().unwrap();
        let catalog = v1::ConfiguredAirbyteCatalog::new(vec![v1::ConfiguredAirbyteStream::new(
            v1::AirbyteStream::new("users", None, json!({"type": "object"})),
            SyncMode::Incremental,
            DestinationSyncMode::AppendDedup,
        )]);
        let down = migrator.downgrade(catalog.clone(), &PROTOCOL_V0).unwrap();
        assert_eq!(down.protocol_major(), 0);
        assert_eq!(migrator.upgrade(down, &PROTOCOL_V0).unwrap(), catalog);
    }

    #[test]
    fn versioned_migrator_binds_version() {
        let shared = Arc::new(AirbyteMessageMigrator::standard().unwrap());
        let bound = VersionedMigrator::new(Arc::clone(&shared), PROTOCOL_V0.clone());
        assert_eq!(bound.version(), &*PROTOCOL_V0);
        assert!(bound.needs_migration());
        assert!(!bound.clone().with_version(PROTOCOL_V1.clone()).needs_migration());
        assert_eq!(bound.canonical_version(), Some(&*PROTOCOL_V1));
        let msg = bound.upgrade(v0_record(), None).unwrap();
        assert_eq!(bound.downgrade(msg, None).unwrap(), v0_record());
    }
}
