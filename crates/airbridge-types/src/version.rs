//! Protocol version value types.
//!
//! [`Version`] is a `major.minor.patch[-suffix]` triple with a `dev` escape
//! hatch: any version string starting with `dev` parses as a dev version that
//! carries no numeric components and compares equal to every other version.
//! [`ProtocolVersionRange`] is the inclusive major-version window a deployment
//! accepts connectors from.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

const DEV_VERSION_PREFIX: &str = "dev";

/// Metadata key holding the lowest protocol version a deployment supports.
pub const PROTOCOL_VERSION_MIN_KEY: &str = "airbyte_protocol_version_min";
/// Metadata key holding the highest protocol version a deployment supports.
pub const PROTOCOL_VERSION_MAX_KEY: &str = "airbyte_protocol_version_max";

/// Version assumed for connectors that do not declare one.
pub static DEFAULT_PROTOCOL_VERSION: LazyLock<Version> = LazyLock::new(|| Version::new(0, 2, 0));
/// Last release of the V0 protocol line.
pub static PROTOCOL_V0: LazyLock<Version> = LazyLock::new(|| Version::new(0, 3, 0));
/// First release of the V1 protocol line.
pub static PROTOCOL_V1: LazyLock<Version> = LazyLock::new(|| Version::new(1, 0, 0));

/// Failure to parse a version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("empty version string")]
    Empty,
    #[error("invalid version string '{input}': expected major.minor.patch")]
    Malformed { input: String },
    #[error("invalid version string '{input}': component '{component}' is not a number")]
    NonNumeric { input: String, component: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Components {
    major: u32,
    minor: u32,
    patch: u32,
}

/// Semantic version with a `dev` escape hatch.
///
/// Equality is structural (`1.0.0` and `1.0.0-rc1` differ); use
/// [`Version::version_compare_to`] for protocol ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    components: Option<Components>,
}

impl Version {
    /// Build a release version from its numeric components.
    #[must_use]
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            raw: format!("{major}.{minor}.{patch}"),
            components: Some(Components {
                major,
                minor,
                patch,
            }),
        }
    }

    /// Parse `major.minor.patch[-suffix]` or a `dev...` string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] when the input is empty, does not have
    /// exactly three dot-separated components, or a component is not an
    /// unsigned integer.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let raw = input.replace('\n', "").trim().to_string();
        if raw.is_empty() {
            return Err(VersionParseError::Empty);
        }
        if raw.starts_with(DEV_VERSION_PREFIX) {
            return Ok(Self {
                raw,
                components: None,
            });
        }

        let core = raw.split('-').next().unwrap_or_default();
        let parts: Vec<&str> = core.split('.').collect();
        let &[major, minor, patch] = parts.as_slice() else {
            return Err(VersionParseError::Malformed { input: raw.clone() });
        };
        let number = |component: &str| {
            component
                .parse::<u32>()
                .map_err(|_| VersionParseError::NonNumeric {
                    input: raw.clone(),
                    component: component.to_string(),
                })
        };
        let components = Components {
            major: number(major)?,
            minor: number(minor)?,
            patch: number(patch)?,
        };

        Ok(Self {
            raw,
            components: Some(components),
        })
    }

    /// Resolve a connector-declared version, falling back to
    /// [`DEFAULT_PROTOCOL_VERSION`] when none is declared.
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] when a declared version is malformed.
    pub fn get_with_default(declared: Option<&str>) -> Result<Self, VersionParseError> {
        match declared {
            Some(v) => Self::parse(v),
            None => Ok(DEFAULT_PROTOCOL_VERSION.clone()),
        }
    }

    #[must_use]
    pub fn major(&self) -> Option<u32> {
        self.components.map(|c| c.major)
    }

    #[must_use]
    pub fn minor(&self) -> Option<u32> {
        self.components.map(|c| c.minor)
    }

    #[must_use]
    pub fn patch(&self) -> Option<u32> {
        self.components.map(|c| c.patch)
    }

    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.components.is_none()
    }

    /// Serialized form, as originally declared (suffix included).
    #[must_use]
    pub fn serialize(&self) -> &str {
        &self.raw
    }

    /// Full `major.minor.patch` numeric ordering.
    ///
    /// A dev version on either side compares equal.
    #[must_use]
    pub fn version_compare_to(&self, other: &Version) -> Ordering {
        match (self.components, other.components) {
            (Some(a), Some(b)) => a
                .major
                .cmp(&b.major)
                .then(a.minor.cmp(&b.minor))
                .then(a.patch.cmp(&b.patch)),
            _ => Ordering::Equal,
        }
    }

    /// `major.minor` ordering, ignoring patch. Same dev short-circuit.
    #[must_use]
    pub fn compatible_version_compare_to(&self, other: &Version) -> Ordering {
        match (self.components, other.components) {
            (Some(a), Some(b)) => a.major.cmp(&b.major).then(a.minor.cmp(&b.minor)),
            _ => Ordering::Equal,
        }
    }

    /// Whether `a` and `b` share a `major.minor` (or either is dev).
    #[must_use]
    pub fn is_compatible(a: &Version, b: &Version) -> bool {
        a.compatible_version_compare_to(b) == Ordering::Equal
    }

    /// True when `self` only moved the patch number forward relative to `other`.
    ///
    /// Always false when either side is dev.
    #[must_use]
    pub fn check_only_patch_version_is_updated(&self, other: &Version) -> bool {
        match (self.components, other.components) {
            (Some(a), Some(b)) => a.major == b.major && a.minor == b.minor && a.patch > b.patch,
            _ => false,
        }
    }

    #[must_use]
    pub fn greater_than(&self, other: &Version) -> bool {
        self.version_compare_to(other) == Ordering::Greater
    }

    #[must_use]
    pub fn greater_than_or_equal_to(&self, other: &Version) -> bool {
        self.version_compare_to(other) != Ordering::Less
    }

    #[must_use]
    pub fn less_than(&self, other: &Version) -> bool {
        self.version_compare_to(other) == Ordering::Less
    }

    #[must_use]
    pub fn less_than_or_equal_to(&self, other: &Version) -> bool {
        self.version_compare_to(other) != Ordering::Greater
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.raw
    }
}

// ---------------------------------------------------------------------------
// Supported range
// ---------------------------------------------------------------------------

/// Inclusive major-version range a deployment supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersionRange {
    pub min: Version,
    pub max: Version,
}

impl ProtocolVersionRange {
    #[must_use]
    pub fn new(min: Version, max: Version) -> Self {
        Self { min, max }
    }

    /// `major(min) <= major(v) <= major(max)`.
    ///
    /// Dev versions are always supported; a dev bound leaves that side open.
    #[must_use]
    pub fn is_supported(&self, version: &Version) -> bool {
        let Some(major) = version.major() else {
            return true;
        };
        let above_min = self.min.major().is_none_or(|min| min <= major);
        let below_max = self.max.major().is_none_or(|max| major <= max);
        above_min && below_max
    }
}

impl fmt::Display for ProtocolVersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
