//! Protocol V0 (`0.x`) models.
//!
//! In V0 every stream's top-level JSON schema is expected to be `object` and
//! every record's `data` an object. The platform does not enforce this on
//! read; it only matters when a V1 message is handed back to a V0 connector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::{json_schema_top_level_type, DestinationSyncMode, SyncMode};
use super::payload::{
    AirbyteConnectionStatus, AirbyteControlMessage, AirbyteLogMessage, AirbyteTraceMessage,
    ConnectorSpecification,
};
use super::state::AirbyteStateMessage;
use super::MessageType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirbyteRecordMessage {
    pub stream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub data: Value,
    pub emitted_at: i64,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirbyteStream {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub json_schema: Value,
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_cursor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cursor_field: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl AirbyteStream {
    /// Whether the schema satisfies V0's object-only rule. An undeclared type
    /// is accepted.
    #[must_use]
    pub fn has_object_schema(&self) -> bool {
        json_schema_top_level_type(&self.json_schema).is_none_or(|ty| ty == "object")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirbyteCatalog {
    pub streams: Vec<AirbyteStream>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredAirbyteStream {
    pub stream: AirbyteStream,
    pub sync_mode: SyncMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cursor_field: Vec<String>,
    pub destination_sync_mode: DestinationSyncMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<Vec<String>>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredAirbyteCatalog {
    pub streams: Vec<ConfiguredAirbyteStream>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

/// A V0 protocol message. Same wire tagging as [`super::v1::AirbyteMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AirbyteMessage {
    Record {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record: Option<AirbyteRecordMessage>,
    },
    State {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<AirbyteStateMessage>,
    },
    Log {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        log: Option<AirbyteLogMessage>,
    },
    Trace {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace: Option<AirbyteTraceMessage>,
    },
    Control {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        control: Option<AirbyteControlMessage>,
    },
    Catalog {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        catalog: Option<AirbyteCatalog>,
    },
    ConnectionStatus {
        #[serde(
            rename = "connectionStatus",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        connection_status: Option<AirbyteConnectionStatus>,
    },
    Spec {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spec: Option<ConnectorSpecification>,
    },
}

impl AirbyteMessage {
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Record { .. } => MessageType::Record,
            Self::State { .. } => MessageType::State,
            Self::Log { .. } => MessageType::Log,
            Self::Trace { .. } => MessageType::Trace,
            Self::Control { .. } => MessageType::Control,
            Self::Catalog { .. } => MessageType::Catalog,
            Self::ConnectionStatus { .. } => MessageType::ConnectionStatus,
            Self::Spec { .. } => MessageType::Spec,
        }
    }
}
