use airbridge_types::protocol::AirbyteStateMessage;
use airbridge_types::state::State;

use super::{SingleStateAggregator, StateAggregator, StateGroup, StreamStateAggregator};
use crate::error::{Result, StateError};

/// Session-level aggregator.
///
/// The first accepted message locks the session to its [`StateGroup`]; the
/// lock never changes afterwards. LEGACY and GLOBAL route to the single-slot
/// strategy, STREAM to the per-stream one.
#[derive(Debug, Clone, Default)]
pub struct DefaultStateAggregator {
    locked: Option<StateGroup>,
    single: SingleStateAggregator,
    stream: StreamStateAggregator,
}

impl DefaultStateAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group this session is locked to, if any message was accepted.
    #[must_use]
    pub fn locked_group(&self) -> Option<StateGroup> {
        self.locked
    }

    /// Fold another aggregator's current result into this one.
    ///
    /// An aggregator that never accepted a message contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MixedStateTypes`] when both are locked to
    /// different groups.
    pub fn ingest_aggregator(&mut self, other: &DefaultStateAggregator) -> Result<()> {
        let Some(incoming) = other.locked else {
            return Ok(());
        };
        self.check(incoming)?;
        self.single.merge(&other.single);
        self.stream.merge(&other.stream);
        self.locked = Some(incoming);
        Ok(())
    }

    fn check(&self, incoming: StateGroup) -> Result<()> {
        match self.locked {
            Some(locked) if locked != incoming => Err(StateError::MixedStateTypes { locked, incoming }),
            _ => Ok(()),
        }
    }
}

impl StateAggregator for DefaultStateAggregator {
    fn ingest(&mut self, message: AirbyteStateMessage) -> Result<()> {
        let incoming = StateGroup::of(message.state_type);
        self.check(incoming)?;
        match incoming {
            StateGroup::Legacy | StateGroup::Global => self.single.ingest(message)?,
            StateGroup::Stream => self.stream.ingest(message)?,
        }
        self.locked = Some(incoming);
        Ok(())
    }

    fn get_aggregated(&self) -> Result<State> {
        match self.locked {
            Some(StateGroup::Stream) => self.stream.get_aggregated(),
            _ => self.single.get_aggregated(),
        }
    }

    fn is_empty(&self) -> bool {
        self.single.is_empty() && self.stream.is_empty()
    }
}
