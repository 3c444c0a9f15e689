//! Checkpoint state for the Airbridge platform.
//!
//! Provides the [`DefaultStateAggregator`] that folds a sync's STATE messages
//! into one checkpoint document, the typed-state conversions applied before
//! persistence, and the [`StateBackend`] trait with an in-memory
//! implementation.

#![warn(clippy::pedantic)]

pub mod aggregator;
pub mod backend;
pub mod error;
pub mod memory;
pub mod typed;

pub use aggregator::{
    DefaultStateAggregator, SingleStateAggregator, StateAggregator, StateGroup, StreamStateAggregator,
};
pub use backend::StateBackend;
pub use error::{Result, StateError};
pub use memory::InMemoryStateBackend;
pub use typed::{get_state, get_typed_state, validate_stream_states};

/// Common imports for state aggregation and backends.
pub mod prelude {
    pub use crate::aggregator::{DefaultStateAggregator, StateAggregator};
    pub use crate::backend::StateBackend;
    pub use crate::error::{Result, StateError};
    pub use crate::memory::InMemoryStateBackend;
    pub use airbridge_types::protocol::{AirbyteStateMessage, StreamDescriptor};
    pub use airbridge_types::state::{ConnectionId, State, StateType, StateWrapper};
}
