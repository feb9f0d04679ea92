//! Core collector traits and errors.

use thiserror::Error;

use crate::source::SourceError;
use crate::stats::ObjectNameError;

/// Errors that end a poll cycle early.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Resolving or querying the statistics source failed.
    #[error("discovery failed: {0}")]
    Discovery(#[source] SourceError),

    /// The discovery pattern is not a valid object name.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] ObjectNameError),
}

/// A unit of work the exporter's scheduler runs on every tick.
///
/// `run` must not fail: errors are logged and the cycle ends so the next
/// tick still happens.
#[async_trait::async_trait]
pub trait Schedulable: Send + Sync + 'static {
    /// Name used in log output.
    fn name(&self) -> &str;

    /// Perform one cycle.
    async fn run(&self);
}
