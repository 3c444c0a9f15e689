//! Protocol migration error types.

use airbridge_types::protocol::StreamDescriptor;

/// A message payload that cannot be reconciled with the configured catalog.
///
/// Scoped to one message; the rest of the stream is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationDataError {
    /// A record references a stream the configured catalog does not contain.
    #[error("record stream '{stream}' is not in the configured catalog")]
    UnknownStream { stream: StreamDescriptor },
}

/// Errors produced while resolving or applying protocol migrations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// No migration path exists between `version` and the canonical version.
    #[error("unsupported protocol version {version}: no migration path to {canonical}")]
    UnsupportedVersion { version: String, canonical: String },

    /// Two steps were registered from the same protocol major.
    #[error("duplicate migration registered from major version {major}")]
    DuplicateMigration { major: u32 },

    /// The registered migration steps do not form a valid chain.
    #[error("invalid migration chain: {reason}")]
    InvalidChain { reason: String },

    /// A message or catalog carried the wrong protocol major for the step
    /// it was handed to.
    #[error("expected a protocol v{expected} payload, got v{actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    /// Per-message data failure.
    #[error(transparent)]
    Data(#[from] MigrationDataError),

    /// Line is not a valid protocol message for the declared version.
    #[error("invalid protocol message: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn unsupported(version: &airbridge_types::Version, canonical: Option<&airbridge_types::Version>) -> Self {
        Self::UnsupportedVersion {
            version: version.serialize().to_string(),
            canonical: canonical.map_or_else(|| "<none>".to_string(), |v| v.serialize().to_string()),
        }
    }

    /// Whether this failure is scoped to a single message.
    ///
    /// Everything else means the connector cannot be talked to at all.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Data(_) | Self::Json(_))
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
