//! Configuration module for the msgrate binary.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Statistics source settings (host URL, discovery pattern, timeout)
//! - Exporter settings (poll interval, push timeout, job name)
//! - Bootstrap properties handed to metrics adapters

mod app;
mod validation;

pub use app::{AppConfig, ExporterConfig, SourceConfig};
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{DEFAULT_PUSH_TIMEOUT, DEFAULT_SOURCE_TIMEOUT, MIN_INTERVAL};
