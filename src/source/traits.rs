//! Core source traits and errors.

use std::sync::Arc;

use thiserror::Error;

use crate::stats::{ObjectName, TimeSlice};

/// Errors raised while discovering or reading statistics.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source cannot be reached or is not ready.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Malformed source URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The entity no longer exists at the source.
    #[error("entity not found: {0}")]
    NotFound(String),
}

/// Resolves the statistics source, e.g. by connecting to the host.
///
/// Called by the collector whenever it holds no source, so an
/// implementation may be asked again after a reset.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync + 'static {
    /// Obtain a source handle.
    async fn resolve(&self) -> Result<Arc<dyn StatisticsSource>, SourceError>;
}

/// A queryable registry of per-entity statistics.
#[async_trait::async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Return handles to every entity whose name matches `pattern`.
    async fn query(&self, pattern: &ObjectName) -> Result<Vec<Arc<dyn EntityHandle>>, SourceError>;
}

/// Read access to one entity's statistics.
#[async_trait::async_trait]
pub trait EntityHandle: Send + Sync {
    /// The entity's object name.
    fn name(&self) -> &ObjectName;

    /// Current time slices, oldest first.
    async fn statistics(&self) -> Result<Vec<TimeSlice>, SourceError>;
}
