//! STATE message payloads.
//!
//! These shapes are identical across protocol V0 and V1, so both versions'
//! message enums carry the same [`AirbyteStateMessage`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Checkpoint granularity declared by a STATE message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AirbyteStateType {
    /// Whole-connection opaque blob.
    Legacy,
    /// Whole-connection blob with a per-stream breakdown.
    Global,
    /// One message per stream.
    Stream,
}

impl AirbyteStateType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "LEGACY",
            Self::Global => "GLOBAL",
            Self::Stream => "STREAM",
        }
    }
}

impl std::fmt::Display for AirbyteStateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a stream by `(namespace, name)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl StreamDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
        }
    }
}

impl std::fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// State of a single stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirbyteStreamState {
    pub stream_descriptor: StreamDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_state: Option<Value>,
}

/// Shared connection state plus a per-stream breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirbyteGlobalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_state: Option<Value>,
    #[serde(default)]
    pub stream_states: Vec<AirbyteStreamState>,
}

/// Record count attached to a state message by source or destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirbyteStateStats {
    #[serde(rename = "recordCount", default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<f64>,
}

/// A STATE message payload.
///
/// `data` is the legacy whole-connection blob. It is `None` both when the
/// connector never set it and when the platform cleared it to avoid
/// duplicating the typed payload; a JSON `null` on the wire also reads as
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirbyteStateMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub state_type: Option<AirbyteStateType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<AirbyteStreamState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<AirbyteGlobalState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(rename = "sourceStats", default, skip_serializing_if = "Option::is_none")]
    pub source_stats: Option<AirbyteStateStats>,
    #[serde(
        rename = "destinationStats",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_stats: Option<AirbyteStateStats>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl AirbyteStateMessage {
    /// Untyped legacy state carrying `data`.
    #[must_use]
    pub fn legacy(data: Value) -> Self {
        Self {
            state_type: Some(AirbyteStateType::Legacy),
            data: Some(data),
            ..Self::default()
        }
    }

    /// Per-stream state for `descriptor`.
    #[must_use]
    pub fn stream(descriptor: StreamDescriptor, state: Value) -> Self {
        Self {
            state_type: Some(AirbyteStateType::Stream),
            stream: Some(AirbyteStreamState {
                stream_descriptor: descriptor,
                stream_state: Some(state),
            }),
            ..Self::default()
        }
    }

    /// Global state with a shared blob and per-stream breakdown.
    #[must_use]
    pub fn global(shared_state: Option<Value>, stream_states: Vec<AirbyteStreamState>) -> Self {
        Self {
            state_type: Some(AirbyteStateType::Global),
            global: Some(AirbyteGlobalState {
                shared_state,
                stream_states,
            }),
            ..Self::default()
        }
    }

    /// Descriptor of the stream this message checkpoints, when per-stream.
    #[must_use]
    pub fn stream_descriptor(&self) -> Option<&StreamDescriptor> {
        self.stream.as_ref().map(|s| &s.stream_descriptor)
    }
}
