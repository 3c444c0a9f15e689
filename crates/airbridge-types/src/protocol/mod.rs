//! Airbyte Protocol wire models.
//!
//! Payloads that never change shape live at this level and are shared by the
//! versioned [`v0`] and [`v1`] message models. RECORD and CATALOG payloads are
//! versioned; the versioned enums re-tag every other variant unchanged.

mod catalog;
mod payload;
mod state;
pub mod v0;
pub mod v1;

pub use catalog::*;
pub use payload::*;
pub use state::*;

use serde::{Deserialize, Serialize};

/// Discriminator of a protocol message, shared across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Record,
    State,
    Log,
    Trace,
    Control,
    Catalog,
    ConnectionStatus,
    Spec,
}

impl MessageType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Record => "RECORD",
            Self::State => "STATE",
            Self::Log => "LOG",
            Self::Trace => "TRACE",
            Self::Control => "CONTROL",
            Self::Catalog => "CATALOG",
            Self::ConnectionStatus => "CONNECTION_STATUS",
            Self::Spec => "SPEC",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
