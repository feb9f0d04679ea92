//! Host Lifecycle
//!
//! The host drives metrics adapters through [`MetricsComponent`], which
//! forwards `init`/`start`/`stop`/`destroy` to every adapter and logs any
//! failure instead of propagating it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::exporter::ExporterError;

/// Key/value configuration handed to adapters at initialisation.
pub type BootstrapProperties = BTreeMap<String, String>;

/// A pluggable metrics backend with a host-managed lifecycle.
///
/// Every hook must tolerate repeated and out-of-order calls.
#[async_trait::async_trait]
pub trait MetricsAdapter: Send + Sync + 'static {
    /// Backend name used in log output, e.g. `"PrometheusMetricsAdapter"`.
    fn implementation_name(&self) -> &str;

    /// Resolve configuration from `bootstrap` and the environment.
    async fn init(&self, bootstrap: &BootstrapProperties) -> Result<(), ExporterError>;

    /// Begin background work.
    async fn start(&self) -> Result<(), ExporterError>;

    /// Stop background work.
    async fn stop(&self) -> Result<(), ExporterError>;

    /// Release resources.
    async fn close(&self) -> Result<(), ExporterError>;
}

/// Host-facing wrapper over a fixed list of adapters.
#[derive(Default)]
pub struct MetricsComponent {
    adapters: Vec<Arc<dyn MetricsAdapter>>,
}

impl MetricsComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter. Hooks run in the order adapters were added.
    pub fn with_adapter(mut self, adapter: Arc<dyn MetricsAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn adapters(&self) -> &[Arc<dyn MetricsAdapter>] {
        &self.adapters
    }

    pub async fn init(&self, config: &BootstrapProperties) {
        for adapter in &self.adapters {
            let name = adapter.implementation_name();
            match adapter.init(config).await {
                Ok(()) => tracing::info!(adapter = %name, "Found and initialized metrics adapter"),
                Err(e) => {
                    tracing::error!(adapter = %name, error = %e, "Could not initialize metrics adapter")
                }
            }
        }
    }

    pub async fn start(&self) {
        for adapter in &self.adapters {
            let name = adapter.implementation_name();
            match adapter.start().await {
                Ok(()) => tracing::info!(adapter = %name, "Started metrics adapter"),
                Err(e) => tracing::error!(adapter = %name, error = %e, "Could not start metrics adapter"),
            }
        }
    }

    pub async fn stop(&self) {
        for adapter in &self.adapters {
            let name = adapter.implementation_name();
            match adapter.stop().await {
                Ok(()) => tracing::info!(adapter = %name, "Stopped metrics adapter"),
                Err(e) => tracing::error!(adapter = %name, error = %e, "Could not stop metrics adapter"),
            }
        }
    }

    pub async fn destroy(&self) {
        for adapter in &self.adapters {
            let name = adapter.implementation_name();
            match adapter.close().await {
                Ok(()) => tracing::info!(adapter = %name, "Destroyed metrics adapter"),
                Err(e) => tracing::error!(adapter = %name, error = %e, "Could not destroy metrics adapter"),
            }
        }
    }
}

impl std::fmt::Debug for MetricsComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self
            .adapters
            .iter()
            .map(|a| a.implementation_name())
            .collect();
        f.debug_struct("MetricsComponent")
            .field("adapters", &names)
            .finish()
    }
}
