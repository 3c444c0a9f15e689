//! Protocol configuration types.

use airbridge_types::version::DEFAULT_PROTOCOL_VERSION;
use airbridge_types::{ProtocolVersionRange, Version, VersionParseError};
use serde::Deserialize;

/// Lines at or above this many characters are logged as suspiciously large.
pub const DEFAULT_MAX_LINE_CHARS: usize = 20_000_000;

/// Deployment-level protocol settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub airbyte_protocol_version_min: Option<String>,
    #[serde(default)]
    pub airbyte_protocol_version_max: Option<String>,
    /// Sniff the connector's version from a leading SPEC message.
    #[serde(default)]
    pub detect_version: bool,
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,
    /// Defer checkpoint writes to the end of a sync that migrates a
    /// connection from LEGACY to STREAM state.
    #[serde(default = "default_true")]
    pub flush_only_at_end_on_migration: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            airbyte_protocol_version_min: None,
            airbyte_protocol_version_max: None,
            detect_version: false,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
            flush_only_at_end_on_migration: true,
        }
    }
}

fn default_max_line_chars() -> usize {
    DEFAULT_MAX_LINE_CHARS
}

fn default_true() -> bool {
    true
}

impl ProtocolConfig {
    /// Supported protocol range of this deployment.
    ///
    /// `None` when neither bound is configured, in which case no connector is
    /// rejected on version grounds. A single configured bound is suspicious
    /// but tolerated: the other falls back to the default protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] when a configured bound is malformed.
    pub fn current_range(&self) -> Result<Option<ProtocolVersionRange>, VersionParseError> {
        let min = self.airbyte_protocol_version_min.as_deref().map(Version::parse).transpose()?;
        let max = self.airbyte_protocol_version_max.as_deref().map(Version::parse).transpose()?;

        if min.is_some() != max.is_some() {
            tracing::warn!(
                min = min.as_ref().map_or("", Version::serialize),
                max = max.as_ref().map_or("", Version::serialize),
                "Inconsistent protocol version range, only one of min/max is set"
            );
        }
        if min.is_none() && max.is_none() {
            return Ok(None);
        }

        Ok(Some(ProtocolVersionRange::new(
            min.unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.clone()),
            max.unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.clone()),
        )))
    }
}
