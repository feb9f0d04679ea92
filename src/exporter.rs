//! Exporter Layer
//!
//! Pushes per-entity message rates to a metrics sink.
//!
//! # Components
//!
//! - [`PrometheusExporter`]: adapter owning the polling schedule and sink
//! - [`MetricsSink`] / [`PushGatewaySink`]: push-add destination
//! - [`ExporterSettings`]: endpoint, labels and interval resolution
//! - [`FixedDelayScheduler`]: cancellable fixed-delay polling task

mod adapter;
mod error;
pub mod pushgateway;
mod scheduler;
pub mod settings;
mod sink;

pub use adapter::{DEFAULT_JOB_NAME, PrometheusExporter, RateListener};
pub use error::{ExporterError, SinkError};
pub use pushgateway::PushGatewaySink;
pub use scheduler::{DEFAULT_SHUTDOWN_TIMEOUT, FixedDelayScheduler};
pub use settings::ExporterSettings;
pub use sink::{MetricsSink, sanitize_metric_name};
