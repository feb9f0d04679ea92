//! Exporter error types.

use thiserror::Error;

/// Errors raised while pushing to the metrics sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Endpoint is not a usable base URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Endpoint failed to parse.
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the sink.
    #[error("push rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Metric construction or encoding failed.
    #[error("metric encoding error: {0}")]
    Encode(#[from] prometheus::Error),
}

/// Errors raised by exporter lifecycle hooks.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Sink could not be configured.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Scheduler failed to stop cleanly.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}
