//! Semantic validation for parsed protocol configuration values.

use anyhow::{bail, Result};
use airbridge_types::version::{PROTOCOL_VERSION_MAX_KEY, PROTOCOL_VERSION_MIN_KEY};
use airbridge_types::Version;

use crate::config::types::ProtocolConfig;

fn parse_bound(raw: Option<&str>, key: &str, errors: &mut Vec<String>) -> Option<Version> {
    let raw = raw?;
    match Version::parse(raw) {
        Ok(version) => Some(version),
        Err(e) => {
            errors.push(format!("{key}: {e}"));
            None
        }
    }
}

/// Validate a parsed protocol configuration.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_protocol_config(config: &ProtocolConfig) -> Result<()> {
    let mut errors = Vec::new();

    let min = parse_bound(
        config.airbyte_protocol_version_min.as_deref(),
        PROTOCOL_VERSION_MIN_KEY,
        &mut errors,
    );
    let max = parse_bound(
        config.airbyte_protocol_version_max.as_deref(),
        PROTOCOL_VERSION_MAX_KEY,
        &mut errors,
    );

    if let (Some(min_major), Some(max_major)) = (
        min.as_ref().and_then(Version::major),
        max.as_ref().and_then(Version::major),
    ) {
        if min_major > max_major {
            errors.push(format!(
                "{PROTOCOL_VERSION_MIN_KEY} major {min_major} is greater than {PROTOCOL_VERSION_MAX_KEY} major {max_major}"
            ));
        }
    }

    if config.max_line_chars == 0 {
        errors.push("max_line_chars must be at least 1".to_string());
    }

    if !errors.is_empty() {
        bail!(
            "Protocol config validation failed:\n  - {}",
            errors.join("\n  - ")
        );
    }

    Ok(())
}
