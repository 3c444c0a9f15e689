use std::collections::HashMap;

use airbridge_types::protocol::{AirbyteStateMessage, StreamDescriptor};
use airbridge_types::state::State;
use serde_json::Value;

use super::StateAggregator;
use crate::error::{Result, StateError};

/// Per-stream upsert for STREAM state.
///
/// Aggregated output is a JSON array in unspecified order.
#[derive(Debug, Clone, Default)]
pub struct StreamStateAggregator {
    states: HashMap<StreamDescriptor, AirbyteStateMessage>,
}

impl StreamStateAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert every stream `other` retains.
    pub fn merge(&mut self, other: &Self) {
        for (descriptor, message) in &other.states {
            self.states.insert(descriptor.clone(), message.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }
}

impl StateAggregator for StreamStateAggregator {
    fn ingest(&mut self, mut message: AirbyteStateMessage) -> Result<()> {
        let descriptor = message
            .stream_descriptor()
            .cloned()
            .ok_or(StateError::MissingStreamDescriptor)?;
        message.data = None;
        self.states.insert(descriptor, message);
        Ok(())
    }

    fn get_aggregated(&self) -> Result<State> {
        let states = self
            .states
            .values()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(State::new(Value::Array(states)))
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream(name: &str, value: i64) -> AirbyteStateMessage {
        AirbyteStateMessage::stream(StreamDescriptor::new(name, None), json!(value))
    }

    fn sorted(value: Value) -> Vec<Value> {
        let mut items = value.as_array().cloned().unwrap_or_default();
        items.sort_by_key(ToString::to_string);
        items
    }

    #[test]
    fn union_with_overwrite() {
        let mut agg = StreamStateAggregator::new();
        agg.ingest(stream("a", 1)).unwrap();
        agg.ingest(stream("b", 2)).unwrap();
        agg.ingest(stream("b", 3)).unwrap();
        assert_eq!(agg.len(), 2);

        let expected = json!([
            serde_json::to_value(stream("a", 1)).unwrap(),
            serde_json::to_value(stream("b", 3)).unwrap(),
        ]);
        assert_eq!(sorted(agg.get_aggregated().unwrap().state), sorted(expected));
    }

    #[test]
    fn namespace_is_part_of_key() {
        let mut agg = StreamStateAggregator::new();
        agg.ingest(stream("users", 1)).unwrap();
        agg.ingest(AirbyteStateMessage::stream(StreamDescriptor::new("users", Some("public")), json!(2)))
            .unwrap();
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn data_is_cleared_on_store() {
        let mut agg = StreamStateAggregator::new();
        let mut message = stream("a", 1);
        message.data = Some(json!({"legacy": true}));
        agg.ingest(message).unwrap();
        let state = agg.get_aggregated().unwrap().state;
        assert!(state[0].get("data").is_none());
    }

    #[test]
    fn missing_descriptor_is_rejected() {
        let mut agg = StreamStateAggregator::new();
        let err = agg.ingest(AirbyteStateMessage::default()).unwrap_err();
        assert!(matches!(err, StateError::MissingStreamDescriptor));
        assert!(agg.is_empty());
    }

    #[test]
    fn empty_is_empty_array() {
        assert_eq!(StreamStateAggregator::new().get_aggregated().unwrap().state, json!([]));
    }
}
