//! Prometheus Pushgateway client.
//!
//! Implements the Pushgateway "push add" call: an HTTP `POST` of the text
//! exposition format to `{endpoint}job/{job}/{label}/{value}...`, where the
//! endpoint is a base URL such as `http://gateway:9091/metrics/`.

use std::collections::BTreeMap;
use std::time::Duration;

use prometheus::{Encoder, Registry, TextEncoder};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::{MetricsSink, SinkError};

/// Default push timeout (5 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sink pushing to a Prometheus Pushgateway.
#[derive(Debug, Clone)]
pub struct PushGatewaySink {
    client: Client,
    endpoint: Url,
}

impl PushGatewaySink {
    /// Create a sink for `endpoint` with the default timeout.
    pub fn new(endpoint: &str) -> Result<Self, SinkError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a sink for `endpoint` with a per-request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, SinkError> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() || !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SinkError::InvalidEndpoint(endpoint.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// The configured base URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Grouping-key URL for `job` and `labels`.
    pub fn push_url(&self, job: &str, labels: &BTreeMap<String, String>) -> Result<Url, SinkError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SinkError::InvalidEndpoint(self.endpoint.to_string()))?;
            segments.pop_if_empty().push("job").push(job);
            for (name, value) in labels {
                segments.push(name).push(value);
            }
        }
        Ok(url)
    }
}

/// Encode every metric in `registry` in the text exposition format.
pub fn encode_text(registry: &Registry) -> Result<(String, Vec<u8>), SinkError> {
    let encoder = TextEncoder::new();
    let mut body = Vec::new();
    encoder.encode(&registry.gather(), &mut body)?;
    Ok((encoder.format_type().to_string(), body))
}

#[async_trait::async_trait]
impl MetricsSink for PushGatewaySink {
    async fn push_add(
        &self,
        registry: &Registry,
        job: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), SinkError> {
        let url = self.push_url(job, labels)?;
        let (content_type, body) = encode_text(registry)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
