//! State backend trait definition.
//!
//! [`StateBackend`] is the storage contract for per-connection checkpoints.
//! Model types live in [`airbridge_types::state`].

use airbridge_types::state::{ConnectionId, StateWrapper};

use crate::error;

/// Storage contract for connection state.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn StateBackend>`.
pub trait StateBackend: Send + Sync {
    /// Read the persisted state for a connection.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn get_state(&self, connection: &ConnectionId) -> error::Result<Option<StateWrapper>>;

    /// Replace the persisted state for a connection.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn put_state(&self, connection: &ConnectionId, state: &StateWrapper) -> error::Result<()>;
}
