//! Versioned protocol line reader and writer.
//!
//! Connectors talk newline-delimited JSON at their own protocol version. The
//! reader turns that stream into canonical messages: it skips garbage lines,
//! drops messages that fail validation or migration, and routes connector
//! LOG messages into `tracing`. The writer does the reverse for messages sent
//! to a connector.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Arc;

use airbridge_protocol::{AirbyteMessageSerDe, VersionedMigrator};
use airbridge_types::protocol::{v1, AirbyteLogMessage, LogLevel};
use airbridge_types::version::DEFAULT_PROTOCOL_VERSION;
use airbridge_types::Version;
use anyhow::Context;
use serde_json::Value;

use crate::config::types::ProtocolConfig;
use crate::errors::SyncError;

/// Lines inspected for a SPEC message when detecting the version.
const VERSION_DETECTION_LOOKAHEAD: usize = 10;

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Iterator of canonical messages read from a connector's output.
///
/// Yields `Err` only for failures that end the stream: an I/O error or a
/// protocol version with no migration path. Per-line problems are logged and
/// the line is skipped.
pub struct VersionedMessageReader<R> {
    reader: R,
    lookahead: VecDeque<String>,
    migrator: VersionedMigrator,
    catalog: Option<Arc<v1::ConfiguredAirbyteCatalog>>,
    max_line_chars: usize,
    done: bool,
}

impl<R: BufRead> VersionedMessageReader<R> {
    /// Wrap `reader`, decoding at `migrator`'s version.
    ///
    /// With `config.detect_version` set, the first lines are scanned for a
    /// SPEC message whose `protocol_version` replaces the configured one;
    /// without such a message the default protocol version is assumed.
    ///
    /// # Errors
    ///
    /// I/O failure during detection, or a malformed detected version.
    pub fn new(
        mut reader: R,
        migrator: VersionedMigrator,
        catalog: Option<Arc<v1::ConfiguredAirbyteCatalog>>,
        config: &ProtocolConfig,
    ) -> Result<Self, SyncError> {
        let mut lookahead = VecDeque::new();
        let mut migrator = migrator;

        if config.detect_version {
            let detected = detect_version(&mut reader, &mut lookahead)?;
            let version = match detected {
                Some(version) => {
                    tracing::info!(version = %version, "Detected protocol version");
                    version
                }
                None => {
                    tracing::info!(
                        version = DEFAULT_PROTOCOL_VERSION.serialize(),
                        "Unable to detect protocol version, assuming default"
                    );
                    DEFAULT_PROTOCOL_VERSION.clone()
                }
            };
            migrator = migrator.with_version(version);
        }

        match migrator.canonical_version() {
            Some(canonical) if migrator.needs_migration() => tracing::info!(
                version = %migrator.version(),
                canonical = %canonical,
                "Reading messages, they will be upgraded to the canonical protocol version"
            ),
            _ => tracing::info!(version = %migrator.version(), "Reading messages"),
        }

        Ok(Self {
            reader,
            lookahead,
            migrator,
            catalog,
            max_line_chars: config.max_line_chars,
            done: false,
        })
    }

    /// Protocol version lines are decoded at.
    #[must_use]
    pub fn version(&self) -> &Version {
        self.migrator.version()
    }

    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        if let Some(line) = self.lookahead.pop_front() {
            return Ok(Some(line));
        }
        read_line(&mut self.reader)
    }

    fn process_line(&self, line: &str) -> Option<Result<v1::AirbyteMessage, SyncError>> {
        if line.len() >= self.max_line_chars && line.chars().count() >= self.max_line_chars {
            tracing::warn!(
                length = line.chars().count(),
                "[LARGE RECORD] Risk of destinations not being able to properly handle this line"
            );
        }

        let message = match AirbyteMessageSerDe::deserialize(line, self.migrator.version()) {
            Ok(message) => message,
            Err(e) if e.is_data_error() => {
                log_malformed_line(line);
                return None;
            }
            Err(e) => return Some(Err(e.into())),
        };

        let message = match self.migrator.upgrade(message, self.catalog.as_deref()) {
            Ok(message) => message,
            Err(e) if e.is_data_error() => {
                tracing::warn!(version = %self.migrator.version(), error = %e, "Failed to upgrade a message");
                return None;
            }
            Err(e) => return Some(Err(e.into())),
        };

        if !self.is_valid(&message) {
            tracing::error!(line, "Validation failed");
            return None;
        }

        if let v1::AirbyteMessage::Log { log } = message {
            if let Some(log) = log {
                forward_log(&log);
            }
            return None;
        }
        Some(Ok(message))
    }

    fn is_valid(&self, message: &v1::AirbyteMessage) -> bool {
        match message {
            v1::AirbyteMessage::Record { record: Some(record) } => {
                !record.stream.is_empty()
                    && self.catalog.as_ref().is_none_or(|catalog| {
                        catalog
                            .find_stream(&record.stream, record.namespace.as_deref())
                            .is_some()
                    })
            }
            v1::AirbyteMessage::Record { record: None } | v1::AirbyteMessage::State { state: None } => false,
            _ => true,
        }
    }
}

impl<R: BufRead> Iterator for VersionedMessageReader<R> {
    type Item = Result<v1::AirbyteMessage, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(anyhow::Error::new(e)
                        .context("Failed to read connector output")
                        .into()));
                }
            };
            if let Some(item) = self.process_line(&line) {
                if item.is_err() {
                    self.done = true;
                }
                return Some(item);
            }
        }
        None
    }
}

/// One line without its terminator, `None` at end of input.
///
/// Invalid UTF-8 is replaced rather than rejected; such a line then fails to
/// parse and is dropped like any other garbage.
fn read_line(reader: &mut impl BufRead) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(match String::from_utf8(buf) {
        Ok(line) => line,
        Err(e) => {
            tracing::debug!("Connector output line is not valid UTF-8");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }))
}

/// Scan up to [`VERSION_DETECTION_LOOKAHEAD`] lines for a SPEC message. Every
/// line read is kept in `lookahead` so nothing is lost.
fn detect_version(reader: &mut impl BufRead, lookahead: &mut VecDeque<String>) -> Result<Option<Version>, SyncError> {
    for _ in 0..VERSION_DETECTION_LOOKAHEAD {
        let Some(line) = read_line(reader).context("Protocol version detection failed")? else {
            break;
        };
        let declared = serde_json::from_str::<Value>(&line).ok().and_then(|json| {
            let is_spec = json
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case("spec"));
            if !is_spec {
                return None;
            }
            Some(
                json.pointer("/spec/protocol_version")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            )
        });
        lookahead.push_back(line);
        if let Some(declared) = declared {
            return Ok(declared.as_deref().map(Version::parse).transpose()?);
        }
    }
    Ok(None)
}

fn log_malformed_line(line: &str) {
    let compact: String = line
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if compact.contains(r#"{"type":"record","record":"#) {
        tracing::warn!("Could not parse the line received from the connector, it seems to be a record message");
        tracing::debug!(line, "Malformed protocol record");
    } else {
        tracing::info!(line, "Malformed non-protocol line");
    }
}

fn forward_log(log: &AirbyteLogMessage) {
    let message = match &log.stack_trace {
        Some(trace) => format!("{}\nStack Trace: {trace}", log.message),
        None => log.message.clone(),
    };
    match log.level {
        LogLevel::Fatal | LogLevel::Error => tracing::error!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Debug => tracing::debug!("{message}"),
        LogLevel::Trace => tracing::trace!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Writes canonical messages to a connector at its protocol version.
pub struct VersionedMessageWriter<W> {
    writer: W,
    migrator: VersionedMigrator,
    catalog: Option<Arc<v1::ConfiguredAirbyteCatalog>>,
}

impl<W: Write> VersionedMessageWriter<W> {
    #[must_use]
    pub fn new(writer: W, migrator: VersionedMigrator, catalog: Option<Arc<v1::ConfiguredAirbyteCatalog>>) -> Self {
        Self {
            writer,
            migrator,
            catalog,
        }
    }

    /// Downgrade `message` and write it as one JSON line.
    ///
    /// # Errors
    ///
    /// Migration failure, or an I/O error from the underlying writer.
    pub fn write(&mut self, message: v1::AirbyteMessage) -> Result<(), SyncError> {
        let versioned = self.migrator.downgrade(message, self.catalog.as_deref())?;
        let line = AirbyteMessageSerDe::serialize(&versioned)?;
        writeln!(self.writer, "{line}").context("Failed to write protocol message")?;
        Ok(())
    }

    /// # Errors
    ///
    /// I/O error from the underlying writer.
    pub fn flush(&mut self) -> Result<(), SyncError> {
        self.writer.flush().context("Failed to flush protocol writer")?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
