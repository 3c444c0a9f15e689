//! V0 (`0.3.0`) <-> V1 (`1.0.0`) migration.
//!
//! Only RECORD and CATALOG payloads have version-specific types at this
//! boundary; everything else is moved across unchanged. Catalog schemas are
//! copied verbatim in both directions.

use airbridge_types::protocol::{v0, v1};
use airbridge_types::version::{PROTOCOL_V0, PROTOCOL_V1};
use airbridge_types::Version;

use crate::error::{MigrationDataError, Result};
use crate::migration::{CatalogMigration, MessageMigration};

pub struct AirbyteMessageMigrationV1 {
    previous: Version,
    current: Version,
}

impl Default for AirbyteMessageMigrationV1 {
    fn default() -> Self {
        Self {
            previous: PROTOCOL_V0.clone(),
            current: PROTOCOL_V1.clone(),
        }
    }
}

impl MessageMigration for AirbyteMessageMigrationV1 {
    type Previous = v0::AirbyteMessage;
    type Current = v1::AirbyteMessage;

    fn previous_version(&self) -> &Version {
        &self.previous
    }

    fn current_version(&self) -> &Version {
        &self.current
    }

    fn upgrade(
        &self,
        message: v0::AirbyteMessage,
        _catalog: Option<&v1::ConfiguredAirbyteCatalog>,
    ) -> Result<v1::AirbyteMessage> {
        Ok(match message {
            v0::AirbyteMessage::Record { record } => v1::AirbyteMessage::Record {
                record: record.map(upgrade_record),
            },
            v0::AirbyteMessage::Catalog { catalog } => v1::AirbyteMessage::Catalog {
                catalog: catalog.map(upgrade_catalog),
            },
            v0::AirbyteMessage::State { state } => v1::AirbyteMessage::State { state },
            v0::AirbyteMessage::Log { log } => v1::AirbyteMessage::Log { log },
            v0::AirbyteMessage::Trace { trace } => v1::AirbyteMessage::Trace { trace },
            v0::AirbyteMessage::Control { control } => v1::AirbyteMessage::Control { control },
            v0::AirbyteMessage::ConnectionStatus { connection_status } => {
                v1::AirbyteMessage::ConnectionStatus { connection_status }
            }
            v0::AirbyteMessage::Spec { spec } => v1::AirbyteMessage::Spec { spec },
        })
    }

    fn downgrade(
        &self,
        message: v1::AirbyteMessage,
        catalog: Option<&v1::ConfiguredAirbyteCatalog>,
    ) -> Result<v0::AirbyteMessage> {
        Ok(match message {
            v1::AirbyteMessage::Record { record } => v0::AirbyteMessage::Record {
                record: record.map(|r| downgrade_record(r, catalog)).transpose()?,
            },
            v1::AirbyteMessage::Catalog { catalog } => v0::AirbyteMessage::Catalog {
                catalog: catalog.map(downgrade_catalog),
            },
            v1::AirbyteMessage::State { state } => v0::AirbyteMessage::State { state },
            v1::AirbyteMessage::Log { log } => v0::AirbyteMessage::Log { log },
            v1::AirbyteMessage::Trace { trace } => v0::AirbyteMessage::Trace { trace },
            v1::AirbyteMessage::Control { control } => v0::AirbyteMessage::Control { control },
            v1::AirbyteMessage::ConnectionStatus { connection_status } => {
                v0::AirbyteMessage::ConnectionStatus { connection_status }
            }
            v1::AirbyteMessage::Spec { spec } => v0::AirbyteMessage::Spec { spec },
        })
    }
}

pub struct ConfiguredCatalogMigrationV1 {
    previous: Version,
    current: Version,
}

impl Default for ConfiguredCatalogMigrationV1 {
    fn default() -> Self {
        Self {
            previous: PROTOCOL_V0.clone(),
            current: PROTOCOL_V1.clone(),
        }
    }
}

impl CatalogMigration for ConfiguredCatalogMigrationV1 {
    type Previous = v0::ConfiguredAirbyteCatalog;
    type Current = v1::ConfiguredAirbyteCatalog;

    fn previous_version(&self) -> &Version {
        &self.previous
    }

    fn current_version(&self) -> &Version {
        &self.current
    }

    fn upgrade(&self, catalog: v0::ConfiguredAirbyteCatalog) -> Result<v1::ConfiguredAirbyteCatalog> {
        Ok(v1::ConfiguredAirbyteCatalog {
            streams: catalog
                .streams
                .into_iter()
                .map(|s| v1::ConfiguredAirbyteStream {
                    stream: upgrade_stream(s.stream),
                    sync_mode: s.sync_mode,
                    cursor_field: s.cursor_field,
                    destination_sync_mode: s.destination_sync_mode,
                    primary_key: s.primary_key,
                    additional_properties: s.additional_properties,
                })
                .collect(),
            additional_properties: catalog.additional_properties,
        })
    }

    fn downgrade(&self, catalog: v1::ConfiguredAirbyteCatalog) -> Result<v0::ConfiguredAirbyteCatalog> {
        Ok(v0::ConfiguredAirbyteCatalog {
            streams: catalog
                .streams
                .into_iter()
                .map(|s| v0::ConfiguredAirbyteStream {
                    stream: downgrade_stream(s.stream),
                    sync_mode: s.sync_mode,
                    cursor_field: s.cursor_field,
                    destination_sync_mode: s.destination_sync_mode,
                    primary_key: s.primary_key,
                    additional_properties: s.additional_properties,
                })
                .collect(),
            additional_properties: catalog.additional_properties,
        })
    }
}

// ---------------------------------------------------------------------------
// Payload conversions
// ---------------------------------------------------------------------------

fn upgrade_record(record: v0::AirbyteRecordMessage) -> v1::AirbyteRecordMessage {
    v1::AirbyteRecordMessage {
        stream: record.stream,
        namespace: record.namespace,
        data: record.data,
        emitted_at: record.emitted_at,
        additional_properties: record.additional_properties,
    }
}

/// V1 allows any top-level record type; V0 declares objects only. When a
/// catalog is supplied the emitting stream must resolve in it. Non-object
/// payloads are handed to V0 as the same raw value, never wrapped.
fn downgrade_record(
    record: v1::AirbyteRecordMessage,
    catalog: Option<&v1::ConfiguredAirbyteCatalog>,
) -> Result<v0::AirbyteRecordMessage> {
    if let Some(catalog) = catalog {
        let configured = catalog
            .find_stream(&record.stream, record.namespace.as_deref())
            .ok_or_else(|| MigrationDataError::UnknownStream {
                stream: record.descriptor(),
            })?;
        if let Some(schema_type) = configured.stream.schema_type().filter(|ty| *ty != "object") {
            tracing::debug!(
                stream = %record.stream,
                schema_type,
                "Downgrading non-object record payload unchanged"
            );
        }
    }

    Ok(v0::AirbyteRecordMessage {
        stream: record.stream,
        namespace: record.namespace,
        data: record.data,
        emitted_at: record.emitted_at,
        additional_properties: record.additional_properties,
    })
}

fn upgrade_catalog(catalog: v0::AirbyteCatalog) -> v1::AirbyteCatalog {
    v1::AirbyteCatalog {
        streams: catalog.streams.into_iter().map(upgrade_stream).collect(),
        additional_properties: catalog.additional_properties,
    }
}

fn downgrade_catalog(catalog: v1::AirbyteCatalog) -> v0::AirbyteCatalog {
    v0::AirbyteCatalog {
        streams: catalog.streams.into_iter().map(downgrade_stream).collect(),
        additional_properties: catalog.additional_properties,
    }
}

fn upgrade_stream(stream: v0::AirbyteStream) -> v1::AirbyteStream {
    v1::AirbyteStream {
        name: stream.name,
        namespace: stream.namespace,
        json_schema: stream.json_schema,
        supported_sync_modes: stream.supported_sync_modes,
        source_defined_cursor: stream.source_defined_cursor,
        default_cursor_field: stream.default_cursor_field,
        source_defined_primary_key: stream.source_defined_primary_key,
        additional_properties: stream.additional_properties,
    }
}

fn downgrade_stream(stream: v1::AirbyteStream) -> v0::AirbyteStream {
    let downgraded = v0::AirbyteStream {
        name: stream.name,
        namespace: stream.namespace,
        json_schema: stream.json_schema,
        supported_sync_modes: stream.supported_sync_modes,
        source_defined_cursor: stream.source_defined_cursor,
        default_cursor_field: stream.default_cursor_field,
        source_defined_primary_key: stream.source_defined_primary_key,
        additional_properties: stream.additional_properties,
    };
    if !downgraded.has_object_schema() {
        tracing::debug!(stream = %downgraded.name, "Stream schema is not an object, V0 connectors may reject it");
    }
    downgraded
}
