//! msgrate - Message-Rate Exporter
//!
//! Polls a host's time-sliced message counters, turns them into per-entity
//! message rates and pushes those rates to a Prometheus Pushgateway. It can
//! be embedded as a library or run standalone with the `msgrate` binary.
//!
//! # Architecture
//!
//! - **Stats**: object names, time slices and entity snapshots
//! - **Source**: host introspection (HTTP/JSON or in-memory)
//! - **Collector**: discovery, polling and listener fan-out
//! - **Calculator**: window-based rate computation with slice deduplication
//! - **Exporter**: settings resolution, fixed-delay scheduling, Pushgateway pushes
//! - **Component**: host lifecycle over a list of metrics adapters
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use msgrate::{MetricsCollector, MetricsComponent, PrometheusExporter};
//! use msgrate::source::http::HttpSourceProvider;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(HttpSourceProvider::new("http://127.0.0.1:8080/"));
//! let collector = Arc::new(MetricsCollector::new(provider)?);
//! let component = MetricsComponent::new()
//!     .with_adapter(Arc::new(PrometheusExporter::new(collector)));
//!
//! let mut properties = msgrate::BootstrapProperties::new();
//! properties.insert("prometheusEndpointUrl".into(), "http://gateway:9091/".into());
//! component.init(&properties).await;
//! component.start().await;
//! # Ok(())
//! # }
//! ```

pub mod calculator;
pub mod collector;
pub mod component;
pub mod config;
pub mod exporter;
pub mod source;
pub mod stats;

// Re-export commonly used types
pub use calculator::{ProcessedSliceCache, Rate, RateCalculator, ZeroReport};
pub use collector::{CollectorError, MetricsCollector, MetricsListener, MetricsNotifier, Schedulable};
pub use component::{BootstrapProperties, MetricsAdapter, MetricsComponent};
pub use exporter::{ExporterError, ExporterSettings, PrometheusExporter, PushGatewaySink};
pub use source::{EntityHandle, SourceError, SourceProvider, StatisticsSource};
pub use stats::{EntityKey, EntitySnapshot, ObjectName, TimeSlice};
