//! Collector Layer
//!
//! Polls the statistics source on each scheduler tick and hands every
//! successful poll's snapshots to registered listeners.
//!
//! # Architecture
//!
//! - [`MetricsCollector`]: lazy discovery, per-entity reads, listener fan-out
//! - [`MetricsListener`] / [`MetricsNotifier`]: listener capability
//! - [`Schedulable`]: the unit of work a scheduler drives
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use msgrate::collector::{MetricsCollector, Schedulable};
//! use msgrate::source::http::HttpSourceProvider;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(HttpSourceProvider::new("http://127.0.0.1:8080/"));
//! let collector = MetricsCollector::new(provider)?;
//! collector.run().await;
//! # Ok(())
//! # }
//! ```

mod listener;
mod metrics;
mod traits;

pub use listener::{MetricsListener, MetricsNotifier};
pub use metrics::{DEFAULT_PATTERN, MetricsCollector};
pub use traits::{CollectorError, Schedulable};
