//! Protocol configuration YAML parsing with environment variable substitution.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::types::ProtocolConfig;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex"));

/// Substitute `${VAR_NAME}` patterns with environment variable values.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let mut missing = Vec::new();
    let substituted = ENV_VAR_RE.replace_all(input, |cap: &regex::Captures<'_>| {
        std::env::var(&cap[1]).unwrap_or_else(|_| {
            missing.push(cap[1].to_string());
            String::new()
        })
    });

    if !missing.is_empty() {
        anyhow::bail!("Missing environment variable(s): {}", missing.join(", "));
    }

    Ok(substituted.into_owned())
}

/// Parse a protocol config YAML string (after env var substitution).
///
/// # Errors
///
/// Returns an error if env var substitution fails or the YAML is invalid.
pub fn parse_protocol_config_str(yaml_str: &str) -> Result<ProtocolConfig> {
    let substituted = substitute_env_vars(yaml_str)?;
    serde_yaml::from_str(&substituted).context("Failed to parse protocol config YAML")
}

/// Parse a protocol config YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the YAML is invalid.
pub fn parse_protocol_config(path: &Path) -> Result<ProtocolConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read protocol config: {}", path.display()))?;
    parse_protocol_config_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_substitution() {
        std::env::set_var("AB_TEST_MAX_VERSION", "1.0.0");
        let result = substitute_env_vars("max: ${AB_TEST_MAX_VERSION}").unwrap();
        assert_eq!(result, "max: 1.0.0");
        std::env::remove_var("AB_TEST_MAX_VERSION");
    }

    #[test]
    fn no_env_vars_passthrough() {
        let input = "detect_version: true";
        assert_eq!(substitute_env_vars(input).unwrap(), input);
    }

    #[test]
    fn all_missing_vars_reported() {
        let err = substitute_env_vars("${AB_MISSING_X} and ${AB_MISSING_Y}").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("AB_MISSING_X"));
        assert!(msg.contains("AB_MISSING_Y"));
    }

    #[test]
    fn parse_from_string() {
        std::env::set_var("AB_TEST_MIN_VERSION", "0.0.0");
        let yaml = r#"
airbyte_protocol_version_min: ${AB_TEST_MIN_VERSION}
airbyte_protocol_version_max: "1.0.0"
detect_version: true
max_line_chars: 1024
"#;
        let config = parse_protocol_config_str(yaml).unwrap();
        assert_eq!(config.airbyte_protocol_version_min.as_deref(), Some("0.0.0"));
        assert_eq!(config.airbyte_protocol_version_max.as_deref(), Some("1.0.0"));
        assert!(config.detect_version);
        assert_eq!(config.max_line_chars, 1024);
        assert!(config.flush_only_at_end_on_migration);
        std::env::remove_var("AB_TEST_MIN_VERSION");
    }

    #[test]
    fn invalid_yaml_errors() {
        assert!(parse_protocol_config_str("this is not: [valid: yaml: {{{}}}").is_err());
    }

    #[test]
    fn missing_file_errors_with_path() {
        let err = parse_protocol_config(Path::new("/nonexistent/protocol.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/protocol.yaml"));
    }
}
