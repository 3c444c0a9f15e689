use airbridge_types::protocol::{AirbyteStateMessage, AirbyteStateType};
use airbridge_types::state::State;
use serde_json::Value;

use super::StateAggregator;
use crate::error::Result;

/// Last-write-wins slot for LEGACY, untyped and GLOBAL state.
#[derive(Debug, Clone, Default)]
pub struct SingleStateAggregator {
    state: Option<AirbyteStateMessage>,
}

impl SingleStateAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over whatever `other` currently retains.
    pub fn merge(&mut self, other: &Self) {
        if let Some(state) = &other.state {
            self.state = Some(state.clone());
        }
    }

    fn aggregated_value(&self) -> Result<Value> {
        let Some(message) = &self.state else {
            return Ok(Value::Null);
        };
        if message.state_type == Some(AirbyteStateType::Global) {
            // `data` would duplicate the per-stream payload inside `global`.
            let global = AirbyteStateMessage {
                data: None,
                ..message.clone()
            };
            return Ok(Value::Array(vec![serde_json::to_value(global)?]));
        }
        Ok(message.data.clone().unwrap_or(Value::Null))
    }
}

impl StateAggregator for SingleStateAggregator {
    fn ingest(&mut self, message: AirbyteStateMessage) -> Result<()> {
        self.state = Some(message);
        Ok(())
    }

    fn get_aggregated(&self) -> Result<State> {
        Ok(State::new(self.aggregated_value()?))
    }

    fn is_empty(&self) -> bool {
        self.state.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airbridge_types::protocol::{AirbyteStreamState, StreamDescriptor};
    use serde_json::json;

    #[test]
    fn legacy_overwrites() {
        let mut agg = SingleStateAggregator::new();
        assert!(agg.is_empty());
        agg.ingest(AirbyteStateMessage::legacy(json!(1))).unwrap();
        agg.ingest(AirbyteStateMessage::legacy(json!(2))).unwrap();
        assert!(!agg.is_empty());
        assert_eq!(agg.get_aggregated().unwrap().state, json!(2));
    }

    #[test]
    fn untyped_returns_data_verbatim() {
        let mut agg = SingleStateAggregator::new();
        let untyped = AirbyteStateMessage {
            data: Some(json!({"cursor": "2024-01-01"})),
            ..AirbyteStateMessage::default()
        };
        agg.ingest(untyped).unwrap();
        assert_eq!(agg.get_aggregated().unwrap().state, json!({"cursor": "2024-01-01"}));
    }

    #[test]
    fn global_is_wrapped_without_data() {
        let mut agg = SingleStateAggregator::new();
        let mut message = AirbyteStateMessage::global(
            Some(json!({"lsn": 10})),
            vec![AirbyteStreamState {
                stream_descriptor: StreamDescriptor::new("users", None),
                stream_state: Some(json!({"id": 4})),
            }],
        );
        message.data = Some(json!({"dup": true}));
        agg.ingest(message).unwrap();

        let state = agg.get_aggregated().unwrap().state;
        assert_eq!(
            state,
            json!([{
                "type": "GLOBAL",
                "global": {
                    "shared_state": {"lsn": 10},
                    "stream_states": [{"stream_descriptor": {"name": "users"}, "stream_state": {"id": 4}}]
                }
            }])
        );
    }

    #[test]
    fn empty_is_null() {
        assert_eq!(SingleStateAggregator::new().get_aggregated().unwrap().state, Value::Null);
    }

    #[test]
    fn merge_takes_other_slot() {
        let mut a = SingleStateAggregator::new();
        a.ingest(AirbyteStateMessage::legacy(json!("a"))).unwrap();
        let mut b = SingleStateAggregator::new();
        a.merge(&b);
        assert_eq!(a.get_aggregated().unwrap().state, json!("a"));
        b.ingest(AirbyteStateMessage::legacy(json!("b"))).unwrap();
        a.merge(&b);
        assert_eq!(a.get_aggregated().unwrap().state, json!("b"));
    }
}
