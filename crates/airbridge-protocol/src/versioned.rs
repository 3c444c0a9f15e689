//! Version-erased carriers for messages and configured catalogs.
//!
//! A migration chain has to move values through several concrete model types;
//! [`VersionedMessage`] and [`VersionedCatalog`] are the closed sums it passes
//! between steps. Adding a protocol major means adding a variant here, and the
//! compiler then flags every match that needs updating.

use airbridge_types::protocol::{v0, v1, MessageType};

use crate::error::{ProtocolError, Result};

/// A protocol message at a known protocol major.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedMessage {
    V0(v0::AirbyteMessage),
    V1(v1::AirbyteMessage),
}

impl VersionedMessage {
    #[must_use]
    pub fn protocol_major(&self) -> u32 {
        match self {
            Self::V0(_) => v0::AirbyteMessage::MAJOR,
            Self::V1(_) => v1::AirbyteMessage::MAJOR,
        }
    }

    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::V0(m) => m.message_type(),
            Self::V1(m) => m.message_type(),
        }
    }
}

/// A configured catalog at a known protocol major.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedCatalog {
    V0(v0::ConfiguredAirbyteCatalog),
    V1(v1::ConfiguredAirbyteCatalog),
}

impl VersionedCatalog {
    #[must_use]
    pub fn protocol_major(&self) -> u32 {
        match self {
            Self::V0(_) => v0::ConfiguredAirbyteCatalog::MAJOR,
            Self::V1(_) => v1::ConfiguredAirbyteCatalog::MAJOR,
        }
    }
}

/// A concrete model type that can travel inside a version-erased carrier.
pub trait ProtocolModel: Sized + Send {
    /// The carrier this model erases into.
    type Carrier;

    /// Protocol major this model belongs to.
    const MAJOR: u32;

    fn into_carrier(self) -> Self::Carrier;

    /// # Errors
    ///
    /// Returns [`ProtocolError::VersionMismatch`] when the carrier holds a
    /// different protocol major.
    fn from_carrier(carrier: Self::Carrier) -> Result<Self>;
}

impl ProtocolModel for v0::AirbyteMessage {
    type Carrier = VersionedMessage;
    const MAJOR: u32 = 0;

    fn into_carrier(self) -> VersionedMessage {
        VersionedMessage::V0(self)
    }

    fn from_carrier(carrier: VersionedMessage) -> Result<Self> {
        match carrier {
            VersionedMessage::V0(m) => Ok(m),
            other => Err(mismatch(Self::MAJOR, other.protocol_major())),
        }
    }
}

impl ProtocolModel for v1::AirbyteMessage {
    type Carrier = VersionedMessage;
    const MAJOR: u32 = 1;

    fn into_carrier(self) -> VersionedMessage {
        VersionedMessage::V1(self)
    }

    fn from_carrier(carrier: VersionedMessage) -> Result<Self> {
        match carrier {
            VersionedMessage::V1(m) => Ok(m),
            other => Err(mismatch(Self::MAJOR, other.protocol_major())),
        }
    }
}

impl ProtocolModel for v0::ConfiguredAirbyteCatalog {
    type Carrier = VersionedCatalog;
    const MAJOR: u32 = 0;

    fn into_carrier(self) -> VersionedCatalog {
        VersionedCatalog::V0(self)
    }

    fn from_carrier(carrier: VersionedCatalog) -> Result<Self> {
        match carrier {
            VersionedCatalog::V0(c) => Ok(c),
            other => Err(mismatch(Self::MAJOR, other.protocol_major())),
        }
    }
}

impl ProtocolModel for v1::ConfiguredAirbyteCatalog {
    type Carrier = VersionedCatalog;
    const MAJOR: u32 = 1;

    fn into_carrier(self) -> VersionedCatalog {
        VersionedCatalog::V1(self)
    }

    fn from_carrier(carrier: VersionedCatalog) -> Result<Self> {
        match carrier {
            VersionedCatalog::V1(c) => Ok(c),
            other => Err(mismatch(Self::MAJOR, other.protocol_major())),
        }
    }
}

fn mismatch(expected: u32, actual: u32) -> ProtocolError {
    ProtocolError::VersionMismatch { expected, actual }
}
