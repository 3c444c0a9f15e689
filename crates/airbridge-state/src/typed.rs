//! Conversion between aggregated [`State`] documents and the typed
//! [`StateWrapper`] view persisted per connection.

use airbridge_types::protocol::{v1::ConfiguredAirbyteCatalog, AirbyteStateMessage, AirbyteStateType};
use airbridge_types::state::{State, StateType, StateWrapper};
use serde_json::Value;

use crate::error::{Result, StateError};

/// Interpret a state document.
///
/// Anything that is not an array of state messages is a LEGACY blob.
/// `None`, JSON `null` and `[]` carry no state.
///
/// # Errors
///
/// Returns [`StateError::UnexpectedStateBlob`] for arrays that mix types or
/// hold more than one non-STREAM message.
pub fn get_typed_state(state: Option<&Value>) -> Result<Option<StateWrapper>> {
    let Some(state) = state.filter(|s| !s.is_null()) else {
        return Ok(None);
    };
    let Ok(mut messages) = serde_json::from_value::<Vec<AirbyteStateMessage>>(state.clone()) else {
        return Ok(Some(StateWrapper::legacy(state.clone())));
    };

    if messages.len() == 1 {
        let message = messages.remove(0);
        return Ok(Some(match message.state_type {
            None => StateWrapper::legacy(state.clone()),
            Some(AirbyteStateType::Legacy) => StateWrapper::legacy(message.data.unwrap_or(Value::Null)),
            Some(AirbyteStateType::Global) => StateWrapper::global(message),
            Some(AirbyteStateType::Stream) => StateWrapper::stream(vec![message]),
        }));
    }
    if messages.is_empty() {
        return Ok(None);
    }
    if messages
        .iter()
        .all(|m| m.state_type == Some(AirbyteStateType::Stream))
    {
        return Ok(Some(StateWrapper::stream(messages)));
    }
    Err(StateError::UnexpectedStateBlob {
        reason: format!(
            "{} state messages that are not all STREAM typed",
            messages.len()
        ),
    })
}

/// Inverse of [`get_typed_state`].
///
/// # Errors
///
/// Returns [`StateError::Json`] if a message cannot be serialized.
pub fn get_state(wrapper: &StateWrapper) -> Result<State> {
    let value = match wrapper.state_type {
        StateType::Legacy => wrapper.legacy_state.clone().unwrap_or(Value::Null),
        StateType::Global => Value::Array(
            wrapper
                .global
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, serde_json::Error>>()?,
        ),
        StateType::Stream => Value::Array(
            wrapper
                .state_messages
                .iter()
                .map(serde_json::to_value)
                .collect::<std::result::Result<Vec<_>, serde_json::Error>>()?,
        ),
    };
    Ok(State::new(value))
}

/// Check that a STREAM state written after a LEGACY to STREAM migration
/// covers every incremental stream of `catalog`. Streams without state
/// would otherwise lose the progress held by the old legacy blob.
///
/// # Errors
///
/// Returns [`StateError::MissingStreamState`] naming the first uncovered
/// stream.
pub fn validate_stream_states(state: &StateWrapper, catalog: &ConfiguredAirbyteCatalog) -> Result<()> {
    let covered: Vec<_> = state
        .state_messages
        .iter()
        .filter_map(AirbyteStateMessage::stream_descriptor)
        .collect();
    match catalog
        .incremental_stream_descriptors()
        .into_iter()
        .find(|d| !covered.contains(&d))
    {
        Some(stream) => Err(StateError::MissingStreamState { stream }),
        None => Ok(()),
    }
}
