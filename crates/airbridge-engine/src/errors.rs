//! Sync error model.

use airbridge_protocol::ProtocolError;
use airbridge_state::StateError;
use airbridge_types::state::ConnectionId;
use airbridge_types::VersionParseError;

// ---------------------------------------------------------------------------
// SyncError: categorised errors for abort and retry decisions
// ---------------------------------------------------------------------------

/// Categorized sync error.
///
/// Contract violations (bad version strings, unsupported protocol majors,
/// mixed state types) are deterministic and never retryable. `Infrastructure`
/// wraps opaque failures from collaborators such as connector stdio.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    VersionParse(#[from] VersionParseError),

    /// The connector's declared version is outside the deployment's range.
    #[error("connector protocol version {version} is not supported, supported range is {range}")]
    UnsupportedProtocolVersion { version: String, range: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("invalid connection id {actual}, expected {expected}")]
    ConnectionMismatch {
        expected: ConnectionId,
        actual: ConnectionId,
    },

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl SyncError {
    /// Returns `true` only for storage failures a later attempt may clear.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::State(StateError::Backend(_)))
    }

    /// Returns `true` when the sync attempt must stop: the failure concerns
    /// the whole connector or session, not a single message.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::VersionParse(_) | Self::UnsupportedProtocolVersion { .. } | Self::ConnectionMismatch { .. } => true,
            Self::Protocol(e) => !e.is_data_error(),
            Self::State(e) => matches!(
                e,
                StateError::MixedStateTypes { .. }
                    | StateError::MissingStreamDescriptor
                    | StateError::UnexpectedStateBlob { .. }
                    | StateError::MissingStreamState { .. }
            ),
            Self::Infrastructure(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airbridge_protocol::MigrationDataError;
    use airbridge_state::StateGroup;
    use airbridge_types::protocol::StreamDescriptor;

    #[test]
    fn contract_errors_are_fatal_and_not_retryable() {
        let errors = [
            SyncError::from(VersionParseError::Empty),
            SyncError::UnsupportedProtocolVersion {
                version: "2.0.0".into(),
                range: "0.0.0..1.0.0".into(),
            },
            SyncError::from(StateError::MixedStateTypes {
                locked: StateGroup::Global,
                incoming: StateGroup::Stream,
            }),
            SyncError::from(ProtocolError::UnsupportedVersion {
                version: "3.0.0".into(),
                canonical: "1.0.0".into(),
            }),
        ];
        for err in errors {
            assert!(err.is_fatal(), "{err}");
            assert!(!err.is_retryable(), "{err}");
        }
    }

    #[test]
    fn data_errors_are_per_message() {
        let err = SyncError::from(ProtocolError::from(MigrationDataError::UnknownStream {
            stream: StreamDescriptor::new("users", None),
        }));
        assert!(!err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn backend_errors_are_retryable() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout");
        let err = SyncError::from(StateError::backend(io));
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn infrastructure_from_anyhow() {
        let err: SyncError = anyhow::anyhow!("stdout closed").into();
        assert!(matches!(err, SyncError::Infrastructure(_)));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "stdout closed");
    }
}
