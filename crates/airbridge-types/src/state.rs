//! Checkpoint document types.
//!
//! Pure data types shared by the state aggregation crate and the engine so
//! neither depends on the other for the persisted shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::AirbyteStateMessage;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque connection identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for ConnectionId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

// ---------------------------------------------------------------------------
// Checkpoint documents
// ---------------------------------------------------------------------------

/// The persisted, opaque checkpoint document produced by aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub state: Value,
}

impl State {
    #[must_use]
    pub fn new(state: Value) -> Self {
        Self { state }
    }
}

/// Representation of a typed checkpoint, as stored per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    Legacy,
    Global,
    Stream,
}

impl StateType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Global => "global",
            Self::Stream => "stream",
        }
    }
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over a [`State`] document.
///
/// Exactly one payload is populated, selected by `state_type`: the raw blob
/// for LEGACY, the single global message for GLOBAL, the per-stream messages
/// for STREAM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateWrapper {
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<AirbyteStateMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_messages: Vec<AirbyteStateMessage>,
}

impl StateWrapper {
    #[must_use]
    pub fn legacy(state: Value) -> Self {
        Self {
            state_type: StateType::Legacy,
            legacy_state: Some(state),
            global: None,
            state_messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn global(message: AirbyteStateMessage) -> Self {
        Self {
            state_type: StateType::Global,
            legacy_state: None,
            global: Some(message),
            state_messages: Vec::new(),
        }
    }

    #[must_use]
    pub fn stream(messages: Vec<AirbyteStateMessage>) -> Self {
        Self {
            state_type: StateType::Stream,
            legacy_state: None,
            global: None,
            state_messages: messages,
        }
    }

    /// Whether the wrapped checkpoint carries no usable progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.state_type {
            StateType::Legacy => self
                .legacy_state
                .as_ref()
                .is_none_or(|v| v.is_null() || v.as_object().is_some_and(serde_json::Map::is_empty)),
            StateType::Global => self.global.is_none(),
            StateType::Stream => self.state_messages.is_empty(),
        }
    }
}
