//! State aggregation and persistence error types.

use airbridge_types::protocol::StreamDescriptor;

use crate::aggregator::StateGroup;

/// Errors produced by aggregation, typed-state conversion and
/// [`StateBackend`](crate::StateBackend) operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A message (or merged aggregator) does not match the type the session
    /// locked in on its first state.
    #[error("mixed state types: session is locked to {locked}, got {incoming}")]
    MixedStateTypes { locked: StateGroup, incoming: StateGroup },

    /// A STREAM-typed message without a stream descriptor.
    #[error("STREAM state message has no stream descriptor")]
    MissingStreamDescriptor,

    /// A persisted state document matches none of the typed shapes.
    #[error("unexpected state blob: {reason}")]
    UnexpectedStateBlob { reason: String },

    /// A LEGACY to STREAM migration finished without state for a configured
    /// incremental stream.
    #[error("state for stream '{stream}' is missing after state type migration")]
    MissingStreamState { stream: StreamDescriptor },

    #[error("state serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal mutex was poisoned by a panicked thread.
    #[error("state backend lock poisoned")]
    LockPoisoned,

    /// Underlying storage failure from a backend implementation.
    #[error("state backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StateError {
    /// Wrap an arbitrary storage error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StateError>;
