//! In-process implementation of [`StateBackend`].
//!
//! Uses a single `Mutex<HashMap>` for thread safety.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use airbridge_types::state::{ConnectionId, StateWrapper};

use crate::backend::StateBackend;
use crate::error::{self, StateError};

#[derive(Debug, Default)]
pub struct InMemoryStateBackend {
    states: Mutex<HashMap<ConnectionId, StateWrapper>>,
}

impl InMemoryStateBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections with persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::LockPoisoned`] if a writer panicked.
    pub fn len(&self) -> error::Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> error::Result<MutexGuard<'_, HashMap<ConnectionId, StateWrapper>>> {
        self.states.lock().map_err(|_| StateError::LockPoisoned)
    }
}

impl StateBackend for InMemoryStateBackend {
    fn get_state(&self, connection: &ConnectionId) -> error::Result<Option<StateWrapper>> {
        Ok(self.lock()?.get(connection).cloned())
    }

    fn put_state(&self, connection: &ConnectionId, state: &StateWrapper) -> error::Result<()> {
        self.lock()?.insert(connection.clone(), state.clone());
        Ok(())
    }
}
