//! Prometheus exporter adapter.
//!
//! Wires a [`MetricsCollector`] to a Pushgateway: the collector is polled on
//! a fixed delay and every non-negative per-entity rate is pushed as a
//! counter named after the entity's statistic id.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use prometheus::{IntCounter, Registry};
use tokio::sync::Mutex;

use super::scheduler::FixedDelayScheduler;
use super::settings::{
    DEFAULT_INTERVAL, EnvLookup, ExporterSettings, PROMETHEUS_ENDPOINT_KEY, process_env,
};
use super::sink::sanitize_metric_name;
use super::{ExporterError, MetricsSink, PushGatewaySink, SinkError};
use crate::calculator::{Rate, RateCalculator};
use crate::collector::{MetricsCollector, MetricsListener, MetricsNotifier};
use crate::component::{BootstrapProperties, MetricsAdapter};
use crate::stats::EntitySnapshot;

/// Pushgateway job name.
pub const DEFAULT_JOB_NAME: &str = "interlok";

const IMPLEMENTATION_NAME: &str = "PrometheusMetricsAdapter";

/// Where rates are pushed once the exporter is initialised.
#[derive(Clone)]
struct PushTarget {
    sink: Arc<dyn MetricsSink>,
    job: String,
    labels: BTreeMap<String, String>,
}

/// Listener computing rates and pushing them to the sink.
///
/// Does nothing until a push target is set by [`PrometheusExporter::init`].
pub struct RateListener {
    calculator: RateCalculator,
    window_secs: u64,
    target: RwLock<Option<PushTarget>>,
}

impl RateListener {
    fn new(calculator: RateCalculator) -> Self {
        Self {
            calculator,
            window_secs: DEFAULT_INTERVAL.as_secs(),
            target: RwLock::new(None),
        }
    }

    /// The calculator backing this listener.
    pub fn calculator(&self) -> &RateCalculator {
        &self.calculator
    }

    async fn export(&self, target: &PushTarget, snapshot: &EntitySnapshot) {
        let rate = match self.calculator.calculate_rate(self.window_secs, snapshot) {
            Ok(rate) => rate,
            Err(e) => {
                tracing::warn!(statistic = %snapshot.statistic_id, error = %e, "Rate calculation failed");
                return;
            }
        };
        let Some(value) = rate.reportable() else {
            tracing::trace!(statistic = %snapshot.statistic_id, "No new data, nothing to push");
            return;
        };

        let name = sanitize_metric_name(&snapshot.statistic_id);
        let registry = match counter_registry(&name, value) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(metric = %name, error = %e, "Could not build metric");
                return;
            }
        };

        tracing::trace!(metric = %name, value, entity = %snapshot.key, zero = rate == Rate::Zero, "Pushing metric to Prometheus");
        if let Err(e) = target
            .sink
            .push_add(&registry, &target.job, &target.labels)
            .await
        {
            tracing::warn!(metric = %name, error = %e, "Could not push to Prometheus");
        }
    }
}

/// One-counter registry for a single push.
fn counter_registry(name: &str, value: u64) -> Result<Registry, SinkError> {
    let counter = IntCounter::new(
        name,
        format!("Number of messages processed for the workflow interceptor named {name}"),
    )?;
    counter.inc_by(value);
    let registry = Registry::new();
    registry.register(Box::new(counter))?;
    Ok(registry)
}

#[async_trait::async_trait]
impl MetricsListener for RateListener {
    async fn on_snapshot_batch(&self, batch: &[EntitySnapshot]) {
        let Some(target) = self.target.read().clone() else {
            return;
        };
        for snapshot in batch {
            self.export(&target, snapshot).await;
        }
    }
}

/// Mutable lifecycle state.
#[derive(Default)]
struct ExporterState {
    sink: Option<Arc<dyn MetricsSink>>,
    settings: Option<ExporterSettings>,
    scheduler: Option<FixedDelayScheduler>,
}

/// Metrics adapter pushing message rates to a Prometheus Pushgateway.
///
/// Lifecycle hooks are idempotent: repeated or out-of-order calls are
/// harmless.
pub struct PrometheusExporter {
    collector: Arc<MetricsCollector>,
    listener: Arc<RateListener>,
    job: String,
    interval: Option<Duration>,
    timeout: Duration,
    env: Arc<EnvLookup>,
    state: Mutex<ExporterState>,
}

impl PrometheusExporter {
    /// Create an exporter for `collector` and register it as a listener.
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self::with_calculator(collector, RateCalculator::new())
    }

    /// Create an exporter using `calculator` for rate computation.
    pub fn with_calculator(collector: Arc<MetricsCollector>, calculator: RateCalculator) -> Self {
        let listener = Arc::new(RateListener::new(calculator));
        collector.register_listener(listener.clone());
        Self {
            collector,
            listener,
            job: DEFAULT_JOB_NAME.to_string(),
            interval: None,
            timeout: super::pushgateway::DEFAULT_TIMEOUT,
            env: Arc::new(process_env),
            state: Mutex::new(ExporterState::default()),
        }
    }

    /// Use `sink` instead of resolving a Pushgateway from the endpoint.
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.state.get_mut().sink = Some(sink);
        self
    }

    /// Fix the poll interval, ignoring the interval property.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the Pushgateway request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the Pushgateway job name.
    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = job.into();
        self
    }

    /// Replace the environment lookup used during `init`.
    pub fn with_env_lookup(
        mut self,
        env: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }

    pub fn listener(&self) -> &Arc<RateListener> {
        &self.listener
    }

    /// Settings resolved by the last `init`.
    pub async fn settings(&self) -> Option<ExporterSettings> {
        self.state.lock().await.settings.clone()
    }

    /// Whether a sink is configured.
    pub async fn has_sink(&self) -> bool {
        self.state.lock().await.sink.is_some()
    }

    /// Whether the polling task is running.
    pub async fn is_running(&self) -> bool {
        self.state
            .lock()
            .await
            .scheduler
            .as_ref()
            .is_some_and(|s| !s.is_finished())
    }

    async fn stop_scheduler(&self, state: &mut ExporterState) -> Result<(), ExporterError> {
        match state.scheduler.take() {
            Some(scheduler) => scheduler
                .shutdown()
                .await
                .map_err(ExporterError::Scheduler),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter")
            .field("collector", &self.collector)
            .field("job", &self.job)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl MetricsAdapter for PrometheusExporter {
    fn implementation_name(&self) -> &str {
        IMPLEMENTATION_NAME
    }

    async fn init(&self, bootstrap: &BootstrapProperties) -> Result<(), ExporterError> {
        let settings = ExporterSettings::resolve_with(bootstrap, self.env.as_ref());
        self.collector.prepare();

        let mut state = self.state.lock().await;
        if state.sink.is_none() {
            match &settings.endpoint {
                Some(endpoint) => {
                    let sink = PushGatewaySink::with_timeout(endpoint, self.timeout)?;
                    tracing::info!(endpoint = %endpoint, "Pushing metrics to Prometheus");
                    state.sink = Some(Arc::new(sink));
                }
                None => {
                    tracing::warn!(
                        property = PROMETHEUS_ENDPOINT_KEY,
                        "Prometheus metrics adapter will not push metrics because the endpoint property is not set"
                    );
                }
            }
        }

        *self.listener.target.write() = state.sink.as_ref().map(|sink| PushTarget {
            sink: Arc::clone(sink),
            job: self.job.clone(),
            labels: settings.labels.clone(),
        });
        state.settings = Some(settings);
        Ok(())
    }

    async fn start(&self) -> Result<(), ExporterError> {
        let mut state = self.state.lock().await;
        if state.sink.is_none() {
            tracing::debug!("No metrics sink configured, polling not started");
            return Ok(());
        }
        if state.scheduler.is_some() {
            tracing::debug!("Metrics polling already running");
            return Ok(());
        }

        let interval = self
            .interval
            .or_else(|| state.settings.as_ref().map(|s| s.interval))
            .unwrap_or(DEFAULT_INTERVAL);
        state.scheduler = Some(FixedDelayScheduler::spawn(
            self.collector.clone(),
            interval,
        ));
        Ok(())
    }

    async fn stop(&self) -> Result<(), ExporterError> {
        let mut state = self.state.lock().await;
        self.stop_scheduler(&mut state).await
    }

    async fn close(&self) -> Result<(), ExporterError> {
        let mut state = self.state.lock().await;
        self.stop_scheduler(&mut state).await
    }
}
