//! Metrics sink abstraction.

use std::collections::BTreeMap;

use prometheus::Registry;

use super::SinkError;

/// Separator character that sink metric names must not contain.
const RESERVED_SEPARATOR: char = '-';

/// Destination for pushed counters.
#[async_trait::async_trait]
pub trait MetricsSink: Send + Sync + 'static {
    /// Add every metric in `registry` under `job`, grouped by `labels`.
    ///
    /// Metrics with the same name in the same group are replaced; other
    /// metrics already held by the sink are kept.
    async fn push_add(
        &self,
        registry: &Registry,
        job: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<(), SinkError>;
}

/// Turn a statistic id into a metric name by stripping the reserved separator.
pub fn sanitize_metric_name(statistic_id: &str) -> String {
    statistic_id.replace(RESERVED_SEPARATOR, "")
}
