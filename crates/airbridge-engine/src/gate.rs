//! Connector protocol gate.
//!
//! A deployment declares the protocol majors it supports; connectors outside
//! that range are rejected before any message is read.

use airbridge_types::{ProtocolVersionRange, Version};
use serde::{Deserialize, Serialize};

use crate::errors::SyncError;

/// Minimal view of a registered connector definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

impl ConnectorDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, protocol_version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            protocol_version: protocol_version.map(str::to_string),
        }
    }
}

/// Resolve a connector's declared protocol version and check it against the
/// deployment range.
///
/// An undeclared version means the default protocol version. Without a
/// configured range every version is accepted.
///
/// # Errors
///
/// [`SyncError::VersionParse`] for a malformed declaration,
/// [`SyncError::UnsupportedProtocolVersion`] when outside `range`.
pub fn check_connector_protocol(
    spec_version: Option<&str>,
    range: Option<&ProtocolVersionRange>,
) -> Result<Version, SyncError> {
    let version = Version::get_with_default(spec_version)?;
    match range {
        Some(range) if !range.is_supported(&version) => Err(SyncError::UnsupportedProtocolVersion {
            version: version.serialize().to_string(),
            range: range.to_string(),
        }),
        _ => Ok(version),
    }
}

/// Keep only definitions this deployment can talk to.
#[must_use]
pub fn filter_supported(
    defs: Vec<ConnectorDefinition>,
    range: Option<&ProtocolVersionRange>,
) -> Vec<ConnectorDefinition> {
    defs.into_iter()
        .filter(|def| match check_connector_protocol(def.protocol_version.as_deref(), range) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(connector = %def.name, error = %e, "Dropping connector definition");
                false
            }
        })
        .collect()
}
