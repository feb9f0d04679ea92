//! Configuration errors and value helpers.

use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;
use url::Url;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse a human-readable duration such as `10s`, `1m30s` or `500ms`.
///
/// Used by the CLI to override the poll interval.
///
/// ```
/// use msgrate::config::parse_duration;
///
/// assert_eq!(parse_duration("10s").unwrap().as_secs(), 10);
/// assert_eq!(parse_duration("1m30s").unwrap().as_secs(), 90);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| format!("invalid duration '{s}': {e}"))
}

/// Parse `value` as an absolute URL, naming `field` in the error.
pub(crate) fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("invalid {field} '{value}': {e}")))
}

/// Expand `${VAR}` and `${VAR:-default}` references from the process
/// environment. Unset variables without a default expand to nothing.
pub fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("placeholder regex is valid")
    });

    placeholder
        .replace_all(input, |caps: &Captures<'_>| {
            lookup(&caps[1])
                .or_else(|| caps.get(2).map(|m| m.as_str().to_string()))
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(name: &str) -> Option<String> {
        (name == "GATEWAY").then(|| "http://gw:9091".to_string())
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert!(parse_duration("10").unwrap_err().contains("invalid duration"));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(
            parse_url("source url", "http://host:8080/").unwrap().port(),
            Some(8080)
        );
        let err = parse_url("source url", "not a url").unwrap_err();
        assert!(err.to_string().contains("invalid source url"));
    }

    #[test]
    fn test_expand_without_placeholders() {
        assert_eq!(expand_with("job: interlok", gateway), "job: interlok");
    }

    #[test]
    fn test_expand_from_lookup() {
        assert_eq!(
            expand_with("url: ${GATEWAY}/metrics/", gateway),
            "url: http://gw:9091/metrics/"
        );
    }

    #[test]
    fn test_expand_default_and_unset() {
        assert_eq!(expand_with("ns: ${K8S_NS:-default}", gateway), "ns: default");
        assert_eq!(expand_with("ns: ${K8S_NS}", gateway), "ns: ");
        assert_eq!(expand_with("${GATEWAY:-unused}", gateway), "http://gw:9091");
    }

    #[test]
    fn test_expand_env_vars_uses_process_env() {
        let result = expand_env_vars("ns: ${NONEXISTENT_MSGRATE_VAR_12345:-default}");
        assert_eq!(result, "ns: default");
    }
}
