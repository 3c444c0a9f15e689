//! Shared Airbridge protocol, version, and checkpoint types.
//!
//! This crate is dependency-boundary-safe: it holds data shapes only and is
//! used by the migration, state, and engine crates alike.

pub mod protocol;
pub mod state;
pub mod version;

pub use version::{ProtocolVersionRange, Version, VersionParseError};
