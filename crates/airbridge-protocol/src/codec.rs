//! Per-version JSON-line (de)serialization.

use airbridge_types::protocol::{v0, v1};
use airbridge_types::Version;

use crate::error::{ProtocolError, Result};
use crate::versioned::{VersionedCatalog, VersionedMessage};

/// Parses and prints protocol lines at a declared version.
///
/// Dev connectors speak the canonical version.
pub struct AirbyteMessageSerDe;

impl AirbyteMessageSerDe {
    /// # Errors
    ///
    /// [`ProtocolError::Json`] when `line` is not a message of the declared
    /// version; [`ProtocolError::UnsupportedVersion`] for a major this build
    /// has no model for.
    pub fn deserialize(line: &str, version: &Version) -> Result<VersionedMessage> {
        match version.major() {
            Some(0) => Ok(VersionedMessage::V0(serde_json::from_str(line)?)),
            Some(1) | None => Ok(VersionedMessage::V1(serde_json::from_str(line)?)),
            Some(_) => Err(ProtocolError::unsupported(version, None)),
        }
    }

    /// Compact single-line JSON, no trailing newline.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Json`] if the payload cannot be serialized.
    pub fn serialize(message: &VersionedMessage) -> Result<String> {
        Ok(match message {
            VersionedMessage::V0(m) => serde_json::to_string(m)?,
            VersionedMessage::V1(m) => serde_json::to_string(m)?,
        })
    }

    /// # Errors
    ///
    /// As [`deserialize`](Self::deserialize), for configured catalogs.
    pub fn deserialize_catalog(raw: &str, version: &Version) -> Result<VersionedCatalog> {
        match version.major() {
            Some(0) => Ok(VersionedCatalog::V0(serde_json::from_str::<v0::ConfiguredAirbyteCatalog>(raw)?)),
            Some(1) | None => Ok(VersionedCatalog::V1(serde_json::from_str::<v1::ConfiguredAirbyteCatalog>(raw)?)),
            Some(_) => Err(ProtocolError::unsupported(version, None)),
        }
    }

    /// # Errors
    ///
    /// [`ProtocolError::Json`] if the catalog cannot be serialized.
    pub fn serialize_catalog(catalog: &VersionedCatalog) -> Result<String> {
        Ok(match catalog {
            VersionedCatalog::V0(c) => serde_json::to_string(c)?,
            VersionedCatalog::V1(c) => serde_json::to_string(c)?,
        })
    }
}
