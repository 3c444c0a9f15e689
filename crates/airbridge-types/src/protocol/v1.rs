//! Protocol V1 (`1.0.0`) models. This is the canonical version the platform
//! operates on.
//!
//! V1 lifts V0's requirement that every stream's top-level JSON schema be
//! `object`: a stream may emit scalar or array records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::{json_schema_top_level_type, DestinationSyncMode, SyncMode};
use super::payload::{
    AirbyteConnectionStatus, AirbyteControlMessage, AirbyteLogMessage, AirbyteTraceMessage,
    ConnectorSpecification,
};
use super::state::{AirbyteStateMessage, StreamDescriptor};
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

impl AirbyteRecordMessage {
    #[must_use]
    pub fn new(stream: impl Into<String>, namespace: Option<&str>, data: Value, emitted_at: i64) -> Self {
        Self {
            stream: stream.into(),
            namespace: namespace.map(str::to_string),
            data,
            emitted_at,
            additional_properties: Map::new(),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> StreamDescriptor {
        StreamDescriptor {
            name: self.stream.clone(),
            namespace: self.namespace.clone(),
        }
    }
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
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: Option<&str>, json_schema: Value) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            json_schema,
            supported_sync_modes: vec![SyncMode::FullRefresh],
            source_defined_cursor: None,
            default_cursor_field: None,
            source_defined_primary_key: None,
            additional_properties: Map::new(),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> StreamDescriptor {
        StreamDescriptor {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }

    /// Declared top-level schema type, if any.
    #[must_use]
    pub fn schema_type(&self) -> Option<&str> {
        json_schema_top_level_type(&self.json_schema)
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

impl ConfiguredAirbyteStream {
    #[must_use]
    pub fn new(stream: AirbyteStream, sync_mode: SyncMode, destination_sync_mode: DestinationSyncMode) -> Self {
        Self {
            stream,
            sync_mode,
            cursor_field: Vec::new(),
            destination_sync_mode,
            primary_key: Vec::new(),
            additional_properties: Map::new(),
        }
    }
}

/// Streams selected for a sync, with per-stream sync settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredAirbyteCatalog {
    pub streams: Vec<ConfiguredAirbyteStream>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl ConfiguredAirbyteCatalog {
    #[must_use]
    pub fn new(streams: Vec<ConfiguredAirbyteStream>) -> Self {
        Self {
            streams,
            additional_properties: Map::new(),
        }
    }

    /// Resolve a configured stream by `(name, namespace)`.
    #[must_use]
    pub fn find_stream(&self, name: &str, namespace: Option<&str>) -> Option<&ConfiguredAirbyteStream> {
        self.streams
            .iter()
            .find(|s| s.stream.name == name && s.stream.namespace.as_deref() == namespace)
    }

    /// Descriptors of every stream configured for incremental sync.
    #[must_use]
    pub fn incremental_stream_descriptors(&self) -> Vec<StreamDescriptor> {
        self.streams
            .iter()
            .filter(|s| s.sync_mode == SyncMode::Incremental)
            .map(|s| s.stream.descriptor())
            .collect()
    }
}

/// A V1 protocol message, tagged by `type` on the wire.
///
/// Every variant's payload is optional so a bare `{"type": "CATALOG"}` line
/// still parses.
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
    pub fn record(record: AirbyteRecordMessage) -> Self {
        Self::Record {
            record: Some(record),
        }
    }

    #[must_use]
    pub fn state(state: AirbyteStateMessage) -> Self {
        Self::State { state: Some(state) }
    }

    #[must_use]
    pub fn log(log: AirbyteLogMessage) -> Self {
        Self::Log { log: Some(log) }
    }

    #[must_use]
    pub fn catalog(catalog: AirbyteCatalog) -> Self {
        Self::Catalog {
            catalog: Some(catalog),
        }
    }

    #[must_use]
    pub fn spec(spec: ConnectorSpecification) -> Self {
        Self::Spec { spec: Some(spec) }
    }

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
