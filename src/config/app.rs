//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ConfigError, expand_env_vars, parse_url};
use crate::calculator::ZeroReport;
use crate::collector::DEFAULT_PATTERN;
use crate::component::BootstrapProperties;
use crate::exporter::DEFAULT_JOB_NAME;
use crate::exporter::settings::PROMETHEUS_ENDPOINT_KEY;
use crate::stats::ObjectName;

// =============================================================================
// Constants
// =============================================================================

/// Default request timeout against the statistics source (5 seconds).
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default Pushgateway request timeout (5 seconds).
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum allowed poll interval (1 second).
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_source_timeout() -> Duration {
    DEFAULT_SOURCE_TIMEOUT
}

fn default_push_timeout() -> Duration {
    DEFAULT_PUSH_TIMEOUT
}

fn default_job() -> String {
    DEFAULT_JOB_NAME.to_string()
}

// =============================================================================
// Source Configuration
// =============================================================================

/// Statistics source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the host's introspection endpoint.
    pub url: String,

    /// Object-name pattern selecting statistics (default: `com.adaptris:type=Metrics,*`).
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Request timeout (default: 5s).
    #[serde(default = "default_source_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

// =============================================================================
// Exporter Configuration
// =============================================================================

/// Exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Poll interval. Falls back to the `collectorIntervalSeconds` property, then 10s.
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,

    /// Push request timeout (default: 5s).
    #[serde(default = "default_push_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Pushgateway job name (default: "interlok").
    #[serde(default = "default_job")]
    pub job: String,

    /// How confirmed-zero rates are reported (default: every poll).
    #[serde(default)]
    pub zero_report: ZeroReport,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            interval: None,
            timeout: DEFAULT_PUSH_TIMEOUT,
            job: default_job(),
            zero_report: ZeroReport::default(),
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Statistics source configuration.
    pub source: SourceConfig,

    /// Exporter configuration.
    #[serde(default)]
    pub exporter: ExporterConfig,

    /// Bootstrap properties passed to metrics adapters.
    #[serde(default)]
    pub properties: BootstrapProperties,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(&expand_env_vars(content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("source url", &self.source.url)?;

        self.source.pattern.parse::<ObjectName>().map_err(|e| {
            ConfigError::ValidationError(format!("invalid source pattern: {}", e))
        })?;

        if self.source.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "source timeout must be positive".to_string(),
            ));
        }

        if let Some(interval) = self.exporter.interval
            && interval < MIN_INTERVAL
        {
            return Err(ConfigError::ValidationError(format!(
                "exporter interval must be at least {:?}",
                MIN_INTERVAL
            )));
        }

        if self.exporter.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "exporter timeout must be positive".to_string(),
            ));
        }

        if self.exporter.job.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "exporter job cannot be empty".to_string(),
            ));
        }

        if let Some(endpoint) = self.properties.get(PROMETHEUS_ENDPOINT_KEY)
            && !endpoint.trim().is_empty()
        {
            parse_url(PROMETHEUS_ENDPOINT_KEY, endpoint)?;
        }

        Ok(())
    }

    /// Bootstrap properties for adapters.
    pub fn bootstrap_properties(&self) -> BootstrapProperties {
        self.properties.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> BootstrapProperties {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const MINIMAL: &str = "source:\n  url: http://127.0.0.1:8080/\n";

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();

        assert_eq!(config.source.pattern, DEFAULT_PATTERN);
        assert_eq!(config.source.timeout, DEFAULT_SOURCE_TIMEOUT);
        assert_eq!(config.exporter.interval, None);
        assert_eq!(config.exporter.timeout, DEFAULT_PUSH_TIMEOUT);
        assert_eq!(config.exporter.job, "interlok");
        assert_eq!(config.exporter.zero_report, ZeroReport::EveryPoll);
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
source:
  url: http://host:8080/api/
  pattern: "com.adaptris:type=Metrics,adapter=main,*"
  timeout: 2s
exporter:
  interval: 30s
  timeout: 1s
  job: integration
  zero_report: once
properties:
  prometheusEndpointUrl: http://gateway:9091/metrics/
  K8S_NAMESPACE: staging
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.source.timeout, Duration::from_secs(2));
        assert_eq!(config.exporter.interval, Some(Duration::from_secs(30)));
        assert_eq!(config.exporter.job, "integration");
        assert_eq!(config.exporter.zero_report, ZeroReport::Once);
        assert_eq!(
            config.bootstrap_properties(),
            properties([
                ("prometheusEndpointUrl", "http://gateway:9091/metrics/"),
                ("K8S_NAMESPACE", "staging"),
            ])
        );
    }

    #[test]
    fn test_env_default_expansion() {
        let yaml = "source:\n  url: ${NONEXISTENT_MSGRATE_SOURCE:-http://fallback:8080/}\n";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.source.url, "http://fallback:8080/");
    }

    #[test]
    fn test_invalid_source_url() {
        let result = AppConfig::from_yaml("source:\n  url: not-a-url\n");
        assert!(result.unwrap_err().to_string().contains("invalid source url"));
    }

    #[test]
    fn test_invalid_pattern() {
        let yaml = "source:\n  url: http://h/\n  pattern: no-domain\n";
        assert!(AppConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_interval_below_minimum() {
        let yaml = format!("{MINIMAL}exporter:\n  interval: 100ms\n");
        let result = AppConfig::from_yaml(&yaml);
        assert!(result.unwrap_err().to_string().contains("at least"));
    }

    #[test]
    fn test_invalid_endpoint_property() {
        let yaml = format!("{MINIMAL}properties:\n  prometheusEndpointUrl: gateway\n");
        assert!(AppConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.source.url, "http://127.0.0.1:8080/");

        assert!(matches!(
            AppConfig::load(dir.path().join("missing.yaml")),
            Err(ConfigError::IoError(_))
        ));
    }
}
