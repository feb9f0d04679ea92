//! Exporter settings resolved at initialisation.
//!
//! Every value is looked up in the process environment first, then in the
//! bootstrap properties. Empty values count as unset.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::component::BootstrapProperties;

/// Property naming the Pushgateway base URL.
pub const PROMETHEUS_ENDPOINT_KEY: &str = "prometheusEndpointUrl";

/// Property overriding the poll interval, in whole seconds.
pub const COLLECTOR_INTERVAL_KEY: &str = "collectorIntervalSeconds";

/// Environment variable carrying the Kubernetes namespace.
pub const K8S_NAMESPACE_ENV: &str = "K8S_NAMESPACE";
/// Label name for the Kubernetes namespace.
pub const K8S_NAMESPACE_LABEL: &str = "k8s_namespace";
/// Namespace used when none is configured.
pub const K8S_NAMESPACE_DEFAULT: &str = "default";

/// Environment variable carrying the Kubernetes pod name.
pub const K8S_POD_NAME_ENV: &str = "K8S_POD_NAME";
/// Label name for the Kubernetes pod name.
pub const K8S_POD_NAME_LABEL: &str = "k8s_pod_name";
/// Pod name used when none is configured.
pub const K8S_POD_NAME_DEFAULT: &str = "interlok";

/// Default poll interval (10 seconds). Also the rate evaluation window.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Environment lookup, injectable for tests.
pub type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Reads the real process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Resolved exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterSettings {
    /// Pushgateway base URL; `None` disables pushing.
    pub endpoint: Option<String>,
    /// Fixed labels attached to every push.
    pub labels: BTreeMap<String, String>,
    /// Poll interval.
    pub interval: Duration,
}

impl ExporterSettings {
    /// Resolve against the process environment and `bootstrap`.
    pub fn resolve(bootstrap: &BootstrapProperties) -> Self {
        Self::resolve_with(bootstrap, &process_env)
    }

    /// Resolve against `env` and `bootstrap`.
    pub fn resolve_with(bootstrap: &BootstrapProperties, env: &EnvLookup) -> Self {
        let lookup = |key: &str| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| bootstrap.get(key).filter(|v| !v.trim().is_empty()).cloned())
        };

        let mut labels = BTreeMap::new();
        for (env_key, label, default) in [
            (K8S_NAMESPACE_ENV, K8S_NAMESPACE_LABEL, K8S_NAMESPACE_DEFAULT),
            (K8S_POD_NAME_ENV, K8S_POD_NAME_LABEL, K8S_POD_NAME_DEFAULT),
        ] {
            let value = lookup(env_key).unwrap_or_else(|| default.to_string());
            tracing::debug!(property = env_key, value = %value, "Evaluated label property");
            labels.insert(label.to_string(), value);
        }

        let interval = match lookup(COLLECTOR_INTERVAL_KEY) {
            None => DEFAULT_INTERVAL,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(property = COLLECTOR_INTERVAL_KEY, value = %raw, default = ?DEFAULT_INTERVAL,
                        "Invalid collector interval. Using default."
                    );
                    DEFAULT_INTERVAL
                }
            },
        };

        Self {
            endpoint: lookup(PROMETHEUS_ENDPOINT_KEY),
            labels,
            interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    fn props(pairs: &[(&str, &str)]) -> BootstrapProperties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_configuration() {
        let settings = ExporterSettings::resolve_with(&props(&[]), &env_of(&[]));

        assert_eq!(settings.endpoint, None);
        assert_eq!(settings.interval, DEFAULT_INTERVAL);
        assert_eq!(settings.labels[K8S_NAMESPACE_LABEL], "default");
        assert_eq!(settings.labels[K8S_POD_NAME_LABEL], "interlok");
    }

    #[test]
    fn test_bootstrap_endpoint() {
        let settings = ExporterSettings::resolve_with(
            &props(&[(PROMETHEUS_ENDPOINT_KEY, "http://gw:9091/metrics/")]),
            &env_of(&[]),
        );
        assert_eq!(settings.endpoint.as_deref(), Some("http://gw:9091/metrics/"));
    }

    #[test]
    fn test_resolve_uses_bootstrap_when_env_unset() {
        let settings =
            ExporterSettings::resolve(&props(&[(COLLECTOR_INTERVAL_KEY, "30")]));
        assert_eq!(settings.interval, Duration::from_secs(30));
        assert_eq!(settings.labels.len(), 2);
    }

    #[test]
    fn test_environment_overrides_bootstrap() {
        let settings = ExporterSettings::resolve_with(
            &props(&[
                (PROMETHEUS_ENDPOINT_KEY, "http://bootstrap:9091/metrics/"),
                (K8S_NAMESPACE_ENV, "from-bootstrap"),
            ]),
            &env_of(&[
                ("prometheusEndpointUrl", "http://env:9091/metrics/"),
                ("K8S_NAMESPACE", "prod"),
                ("K8S_POD_NAME", "pod-7"),
            ]),
        );

        assert_eq!(settings.endpoint.as_deref(), Some("http://env:9091/metrics/"));
        assert_eq!(settings.labels[K8S_NAMESPACE_LABEL], "prod");
        assert_eq!(settings.labels[K8S_POD_NAME_LABEL], "pod-7");
    }

    #[test]
    fn test_empty_values_are_unset() {
        let settings = ExporterSettings::resolve_with(
            &props(&[(PROMETHEUS_ENDPOINT_KEY, "http://bootstrap:9091/metrics/")]),
            &env_of(&[("prometheusEndpointUrl", ""), ("K8S_POD_NAME", "  ")]),
        );
        assert_eq!(
            settings.endpoint.as_deref(),
            Some("http://bootstrap:9091/metrics/")
        );
        assert_eq!(settings.labels[K8S_POD_NAME_LABEL], "interlok");
    }

    #[test]
    fn test_interval_property() {
        let settings = ExporterSettings::resolve_with(
            &props(&[(COLLECTOR_INTERVAL_KEY, "30")]),
            &env_of(&[]),
        );
        assert_eq!(settings.interval, Duration::from_secs(30));

        let invalid = ExporterSettings::resolve_with(
            &props(&[(COLLECTOR_INTERVAL_KEY, "0")]),
            &env_of(&[]),
        );
        assert_eq!(invalid.interval, DEFAULT_INTERVAL);
    }
}
