//! Checkpoint buffering and persistence for a running sync.
//!
//! STATE messages are aggregated into a live buffer. Each flush rotates that
//! buffer into a pending slot and writes it through the [`StateBackend`]; a
//! failed write keeps the pending slot so the next flush merges newer state
//! into it instead of dropping it.

use std::sync::Arc;

use airbridge_state::{
    get_typed_state, validate_stream_states, DefaultStateAggregator, StateAggregator, StateBackend, StateError,
    StateGroup,
};
use airbridge_types::protocol::{v1::ConfiguredAirbyteCatalog, AirbyteStateMessage, AirbyteStateType};
use airbridge_types::state::{ConnectionId, StateType};

use crate::config::types::ProtocolConfig;
use crate::errors::SyncError;

/// Double-buffered checkpoint writer for one connection.
///
/// Not meant for concurrent use: the caller serializes `persist`, `flush`
/// and `close`, typically from the replication loop plus a periodic timer.
pub struct SyncPersistence {
    connection: ConnectionId,
    backend: Arc<dyn StateBackend>,
    catalog: Arc<ConfiguredAirbyteCatalog>,
    buffer: DefaultStateAggregator,
    to_flush: Option<DefaultStateAggregator>,
    /// Type lock shared by every buffer rotation of this session.
    session_group: Option<StateGroup>,
    flush_enabled: bool,
    only_flush_at_end: bool,
    defer_on_migration: bool,
}

impl SyncPersistence {
    #[must_use]
    pub fn new(
        connection: ConnectionId,
        backend: Arc<dyn StateBackend>,
        catalog: Arc<ConfiguredAirbyteCatalog>,
        config: &ProtocolConfig,
    ) -> Self {
        Self {
            connection,
            backend,
            catalog,
            buffer: DefaultStateAggregator::new(),
            to_flush: None,
            session_group: None,
            flush_enabled: false,
            only_flush_at_end: false,
            defer_on_migration: config.flush_only_at_end_on_migration,
        }
    }

    /// Buffer a STATE message for `connection`.
    ///
    /// The first message also decides whether periodic flushing may start:
    /// when the connection currently holds LEGACY state and the sync emits
    /// STREAM state, every write is deferred to [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// [`SyncError::ConnectionMismatch`] for another connection's state, and
    /// [`StateError::MixedStateTypes`] when the message does not match the
    /// session's state type.
    pub fn persist(&mut self, connection: &ConnectionId, message: AirbyteStateMessage) -> Result<(), SyncError> {
        if *connection != self.connection {
            return Err(SyncError::ConnectionMismatch {
                expected: self.connection.clone(),
                actual: connection.clone(),
            });
        }

        let incoming = StateGroup::of(message.state_type);
        if let Some(locked) = self.session_group.filter(|locked| *locked != incoming) {
            return Err(StateError::MixedStateTypes { locked, incoming }.into());
        }

        let state_type = message.state_type;
        self.buffer.ingest(message)?;
        self.session_group = Some(incoming);
        self.check_migration(state_type);
        Ok(())
    }

    /// Whether all writes are held back until [`close`](Self::close).
    #[must_use]
    pub fn is_flush_deferred(&self) -> bool {
        self.only_flush_at_end
    }

    /// Periodic flush.
    ///
    /// Never fails: a write error is logged and the pending state is kept
    /// for the next flush.
    pub fn flush(&mut self) {
        if !self.flush_enabled || self.only_flush_at_end {
            return;
        }
        let result = self.prepare_for_flush().and_then(|()| self.write_pending());
        if let Err(e) = result {
            tracing::warn!(
                connection = %self.connection,
                error = %e,
                "Failed to persist state, it will be retried as part of the next flush"
            );
        }
    }

    /// Final flush at the end of a sync.
    ///
    /// After a LEGACY to STREAM migration the aggregated state must cover
    /// every incremental stream of the catalog, otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// [`StateError::MissingStreamState`] from migration validation, or the
    /// backend's write failure.
    pub fn close(&mut self) -> Result<(), SyncError> {
        if self.buffer.is_empty() && self.to_flush.is_none() {
            return Ok(());
        }
        self.prepare_for_flush()?;
        if self.only_flush_at_end {
            self.validate_stream_migration()?;
        }
        self.write_pending()?;
        tracing::info!(connection = %self.connection, "Final state flush completed");
        Ok(())
    }

    fn check_migration(&mut self, state_type: Option<AirbyteStateType>) {
        if self.flush_enabled || self.only_flush_at_end {
            return;
        }

        let persisted = match self.backend.get_state(&self.connection) {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(
                    connection = %self.connection,
                    error = %e,
                    "Failed to check current state, it will be retried next time we see a state"
                );
                return;
            }
        };
        let migrating = persisted
            .as_ref()
            .is_some_and(|p| p.state_type == StateType::Legacy && !p.is_empty())
            && state_type == Some(AirbyteStateType::Stream);

        if migrating && self.defer_on_migration {
            tracing::info!(
                connection = %self.connection,
                "State type migration from LEGACY to STREAM detected, all states will be persisted at the end of the sync"
            );
            self.only_flush_at_end = true;
            return;
        }
        tracing::info!(connection = %self.connection, "Starting periodic state flush");
        self.flush_enabled = true;
    }

    /// Rotate the live buffer into the pending slot.
    fn prepare_for_flush(&mut self) -> Result<(), SyncError> {
        let buffer = std::mem::take(&mut self.buffer);
        match &mut self.to_flush {
            Some(pending) => pending.ingest_aggregator(&buffer)?,
            None => self.to_flush = Some(buffer),
        }
        Ok(())
    }

    fn write_pending(&mut self) -> Result<(), SyncError> {
        let Some(pending) = self.to_flush.as_ref().filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        let state = pending.get_aggregated()?;
        let Some(wrapper) = get_typed_state(Some(&state.state))? else {
            return Ok(());
        };
        self.backend.put_state(&self.connection, &wrapper)?;
        self.to_flush = None;
        tracing::debug!(connection = %self.connection, state_type = %wrapper.state_type, "State committed");
        Ok(())
    }

    fn validate_stream_migration(&self) -> Result<(), SyncError> {
        let Some(pending) = &self.to_flush else {
            return Ok(());
        };
        let state = pending.get_aggregated()?;
        if let Some(wrapper) = get_typed_state(Some(&state.state))?.filter(|w| w.state_type == StateType::Stream) {
            validate_stream_states(&wrapper, &self.catalog)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use airbridge_state::InMemoryStateBackend;
    use airbridge_types::protocol::v1::{AirbyteStream, ConfiguredAirbyteStream};
    use airbridge_types::protocol::{DestinationSyncMode, StreamDescriptor, SyncMode};
    use airbridge_types::state::StateWrapper;
    use serde_json::json;

    /// Backend whose writes can be switched off.
    #[derive(Default)]
    struct FlakyBackend {
        inner: InMemoryStateBackend,
        failing: AtomicBool,
    }

    impl StateBackend for FlakyBackend {
        fn get_state(&self, connection: &ConnectionId) -> airbridge_state::Result<Option<StateWrapper>> {
            self.inner.get_state(connection)
        }

        fn put_state(&self, connection: &ConnectionId, state: &StateWrapper) -> airbridge_state::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StateError::backend(std::io::Error::other("backend down")));
            }
            self.inner.put_state(connection, state)
        }
    }

    fn catalog() -> Arc<ConfiguredAirbyteCatalog> {
        let stream = |name: &str| {
            ConfiguredAirbyteStream::new(
                AirbyteStream::new(name, None, json!({"type": "object"})),
                SyncMode::Incremental,
                DestinationSyncMode::Append,
            )
        };
        Arc::new(ConfiguredAirbyteCatalog::new(vec![stream("users"), stream("orders")]))
    }

    fn conn() -> ConnectionId {
        ConnectionId::new("conn-1")
    }

    fn stream(name: &str, v: i64) -> AirbyteStateMessage {
        AirbyteStateMessage::stream(StreamDescriptor::new(name, None), json!(v))
    }

    fn persistence(backend: Arc<dyn StateBackend>) -> SyncPersistence {
        SyncPersistence::new(conn(), backend, catalog(), &ProtocolConfig::default())
    }

    #[test]
    fn rejects_foreign_connection() {
        let mut p = persistence(Arc::new(InMemoryStateBackend::new()));
        let err = p.persist(&ConnectionId::new("other"), stream("users", 1)).unwrap_err();
        assert!(matches!(err, SyncError::ConnectionMismatch { .. }));
    }

    #[test]
    fn flush_writes_latest_state() {
        let backend = Arc::new(InMemoryStateBackend::new());
        let mut p = persistence(backend.clone());
        p.persist(&conn(), AirbyteStateMessage::legacy(json!({"c": 1}))).unwrap();
        p.persist(&conn(), AirbyteStateMessage::legacy(json!({"c": 2}))).unwrap();
        p.flush();
        assert_eq!(backend.get_state(&conn()).unwrap(), Some(StateWrapper::legacy(json!({"c": 2}))));
    }

    #[test]
    fn failed_flush_is_merged_into_next_one() {
        let backend = Arc::new(FlakyBackend::default());
        let mut p = persistence(backend.clone());
        p.persist(&conn(), stream("users", 1)).unwrap();
        backend.failing.store(true, Ordering::SeqCst);
        p.flush();
        assert!(backend.get_state(&conn()).unwrap().is_none());

        backend.failing.store(false, Ordering::SeqCst);
        p.persist(&conn(), stream("orders", 2)).unwrap();
        p.flush();
        let stored = backend.get_state(&conn()).unwrap().unwrap();
        assert_eq!(stored.state_type, StateType::Stream);
        assert_eq!(stored.state_messages.len(), 2);
    }

    #[test]
    fn mixed_types_across_rotations_are_rejected() {
        let mut p = persistence(Arc::new(InMemoryStateBackend::new()));
        p.persist(&conn(), stream("users", 1)).unwrap();
        p.flush();
        let err = p.persist(&conn(), AirbyteStateMessage::legacy(json!(1))).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn legacy_to_stream_defers_until_close() {
        let backend = Arc::new(InMemoryStateBackend::new());
        backend.put_state(&conn(), &StateWrapper::legacy(json!({"cursor": 9}))).unwrap();
        let mut p = persistence(backend.clone());
        p.persist(&conn(), stream("users", 1)).unwrap();
        assert!(p.is_flush_deferred());
        p.persist(&conn(), stream("orders", 2)).unwrap();
        p.flush();
        assert_eq!(backend.get_state(&conn()).unwrap(), Some(StateWrapper::legacy(json!({"cursor": 9}))));

        p.close().unwrap();
        let stored = backend.get_state(&conn()).unwrap().unwrap();
        assert_eq!(stored.state_type, StateType::Stream);
    }

    #[test]
    fn incomplete_migration_fails_on_close() {
        let backend = Arc::new(InMemoryStateBackend::new());
        backend.put_state(&conn(), &StateWrapper::legacy(json!({"cursor": 9}))).unwrap();
        let mut p = persistence(backend.clone());
        p.persist(&conn(), stream("users", 1)).unwrap();
        let err = p.close().unwrap_err();
        assert!(matches!(err, SyncError::State(StateError::MissingStreamState { .. })));
        assert_eq!(backend.get_state(&conn()).unwrap(), Some(StateWrapper::legacy(json!({"cursor": 9}))));
    }

    #[test]
    fn migration_deferral_can_be_disabled() {
        let backend = Arc::new(InMemoryStateBackend::new());
        backend.put_state(&conn(), &StateWrapper::legacy(json!({"cursor": 9}))).unwrap();
        let config = ProtocolConfig {
            flush_only_at_end_on_migration: false,
            ..ProtocolConfig::default()
        };
        let mut p = SyncPersistence::new(conn(), backend.clone(), catalog(), &config);
        p.persist(&conn(), stream("users", 1)).unwrap();
        assert!(!p.is_flush_deferred());
        p.flush();
        assert_eq!(backend.get_state(&conn()).unwrap().map(|s| s.state_type), Some(StateType::Stream));
    }

    #[test]
    fn close_surfaces_backend_failure() {
        let backend = Arc::new(FlakyBackend::default());
        backend.failing.store(true, Ordering::SeqCst);
        let mut p = persistence(backend);
        p.persist(&conn(), AirbyteStateMessage::legacy(json!(1))).unwrap();
        let err = p.close().unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn close_without_state_is_noop() {
        let backend = Arc::new(InMemoryStateBackend::new());
        persistence(backend.clone()).close().unwrap();
        assert_eq!(backend.len().unwrap(), 0);
    }
}
