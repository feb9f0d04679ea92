//! Host introspection over HTTP/JSON.
//!
//! The host lists its statistic object names at `GET {base}/metrics` and
//! serves the slices of one entity at `GET {base}/metrics/{name}`, with the
//! name percent-encoded as a single path segment.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::{EntityHandle, SourceError, SourceProvider, StatisticsSource};
use crate::stats::{ObjectName, TimeSlice};

/// Default request timeout (5 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const METRICS_SEGMENT: &str = "metrics";

/// Resolves an [`HttpStatisticsSource`] for a host base URL.
#[derive(Debug, Clone)]
pub struct HttpSourceProvider {
    url: String,
    timeout: Duration,
}

impl HttpSourceProvider {
    /// Create a provider for the host at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl SourceProvider for HttpSourceProvider {
    async fn resolve(&self) -> Result<Arc<dyn StatisticsSource>, SourceError> {
        let base = Url::parse(&self.url)?;
        if base.cannot_be_a_base() {
            return Err(SourceError::Unavailable(format!(
                "'{}' cannot be used as a base url",
                self.url
            )));
        }
        let client = Client::builder().timeout(self.timeout).build()?;
        tracing::debug!(url = %base, "Resolved HTTP statistics source");
        Ok(Arc::new(HttpStatisticsSource { client, base }))
    }
}

/// Statistics source backed by the host's HTTP introspection endpoint.
#[derive(Debug)]
pub struct HttpStatisticsSource {
    client: Client,
    base: Url,
}

impl HttpStatisticsSource {
    fn endpoint(&self, name: Option<&ObjectName>) -> Result<Url, SourceError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                SourceError::Unavailable(format!("'{}' cannot be used as a base url", self.base))
            })?;
            segments.pop_if_empty().push(METRICS_SEGMENT);
            if let Some(name) = name {
                segments.push(&name.to_string());
            }
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl StatisticsSource for HttpStatisticsSource {
    async fn query(&self, pattern: &ObjectName) -> Result<Vec<Arc<dyn EntityHandle>>, SourceError> {
        let url = self.endpoint(None)?;
        let names: Vec<String> = fetch_json(&self.client, url).await?;

        let mut handles: Vec<Arc<dyn EntityHandle>> = Vec::new();
        for raw in names {
            let name: ObjectName = match raw.parse() {
                Ok(name) => name,
                Err(e) => {
                    tracing::debug!(name = %raw, error = %e, "Skipping unparsable object name");
                    continue;
                }
            };
            if !pattern.matches(&name) {
                continue;
            }
            tracing::trace!(name = %name, "Found statistics source");
            let url = self.endpoint(Some(&name))?;
            handles.push(Arc::new(HttpEntityHandle {
                client: self.client.clone(),
                url,
                name,
            }));
        }
        Ok(handles)
    }
}

/// Handle to one entity exposed over HTTP.
#[derive(Debug)]
pub struct HttpEntityHandle {
    client: Client,
    url: Url,
    name: ObjectName,
}

#[async_trait::async_trait]
impl EntityHandle for HttpEntityHandle {
    fn name(&self) -> &ObjectName {
        &self.name
    }

    async fn statistics(&self) -> Result<Vec<TimeSlice>, SourceError> {
        match fetch_json(&self.client, self.url.clone()).await {
            Err(SourceError::Status { status: 404, .. }) => {
                Err(SourceError::NotFound(self.name.to_string()))
            }
            other => other,
        }
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: Url,
) -> Result<T, SourceError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(base: &str) -> HttpStatisticsSource {
        HttpStatisticsSource {
            client: Client::new(),
            base: Url::parse(base).unwrap(),
        }
    }

    #[test]
    fn test_endpoint_listing() {
        let src = source("http://host:8080/api/");
        assert_eq!(
            src.endpoint(None).unwrap().as_str(),
            "http://host:8080/api/metrics"
        );
    }

    #[test]
    fn test_endpoint_encodes_name_as_one_segment() {
        let src = source("http://host:8080");
        let name: ObjectName = "com.adaptris:type=Metrics,id=a/b".parse().unwrap();
        let url = src.endpoint(Some(&name)).unwrap();
        assert_eq!(url.path_segments().unwrap().count(), 2);
        assert!(url.as_str().contains("id=a%2Fb"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_invalid_url() {
        let provider = HttpSourceProvider::new("not a url");
        assert!(matches!(
            provider.resolve().await,
            Err(SourceError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_query_unreachable_host_fails() {
        let provider = HttpSourceProvider::new("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(500));
        let source = provider.resolve().await.unwrap();
        let pattern: ObjectName = "com.adaptris:type=Metrics,*".parse().unwrap();
        assert!(source.query(&pattern).await.is_err());
    }
}
