//! STATE message aggregation.
//!
//! A sync emits many STATE messages; only the latest progress matters. An
//! aggregator folds them into the one [`State`] document that gets persisted.
//! [`DefaultStateAggregator`] is the entry point: it locks the session to the
//! state type of the first message and routes to the matching strategy.

mod default;
mod single;
mod stream;

pub use default::DefaultStateAggregator;
pub use single::SingleStateAggregator;
pub use stream::StreamStateAggregator;

use airbridge_types::protocol::{AirbyteStateMessage, AirbyteStateType};
use airbridge_types::state::State;

use crate::error::Result;

/// Folds STATE messages into a single checkpoint document.
pub trait StateAggregator: Send {
    /// # Errors
    ///
    /// Returns [`StateError`](crate::StateError) when `message` cannot be
    /// accepted by this aggregator.
    fn ingest(&mut self, message: AirbyteStateMessage) -> Result<()>;

    /// # Errors
    ///
    /// Returns [`StateError::Json`](crate::StateError::Json) if a retained
    /// message cannot be serialized.
    fn get_aggregated(&self) -> Result<State>;

    /// True until the first successful ingest.
    fn is_empty(&self) -> bool;
}

/// Compatibility group of a state type. Untyped messages belong to LEGACY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateGroup {
    Legacy,
    Global,
    Stream,
}

impl StateGroup {
    #[must_use]
    pub fn of(state_type: Option<AirbyteStateType>) -> Self {
        match state_type {
            None | Some(AirbyteStateType::Legacy) => Self::Legacy,
            Some(AirbyteStateType::Global) => Self::Global,
            Some(AirbyteStateType::Stream) => Self::Stream,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "LEGACY",
            Self::Global => "GLOBAL",
            Self::Stream => "STREAM",
        }
    }
}

impl std::fmt::Display for StateGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_is_legacy() {
        assert_eq!(StateGroup::of(None), StateGroup::Legacy);
        assert_eq!(StateGroup::of(Some(AirbyteStateType::Legacy)), StateGroup::Legacy);
        assert_eq!(StateGroup::of(Some(AirbyteStateType::Global)), StateGroup::Global);
        assert_eq!(StateGroup::of(Some(AirbyteStateType::Stream)), StateGroup::Stream);
    }
}
