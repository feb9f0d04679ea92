//! Poll-and-notify collector for message statistics.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use super::listener::{MetricsListener, MetricsNotifier, same_listener};
use super::traits::{CollectorError, Schedulable};
use crate::source::{EntityHandle, SourceProvider, StatisticsSource};
use crate::stats::{EntitySnapshot, ObjectName};

/// Default discovery pattern for message statistics.
pub const DEFAULT_PATTERN: &str = "com.adaptris:type=Metrics,*";

const COLLECTOR_NAME: &str = "message-metrics";

/// Cached discovery results. Cleared by [`MetricsCollector::prepare`].
///
/// `generation` is bumped on every reset; results fetched under an older
/// generation are used for that poll but never cached.
#[derive(Default)]
struct Discovery {
    source: Option<Arc<dyn StatisticsSource>>,
    handles: Option<Vec<Arc<dyn EntityHandle>>>,
    generation: u64,
}


/// Polls a statistics source and fans snapshot batches out to listeners.
///
/// The source and the set of matching entities are resolved lazily on the
/// first poll and cached until [`prepare`](Self::prepare) is called.
pub struct MetricsCollector {
    provider: Arc<dyn SourceProvider>,
    pattern: ObjectName,
    discovery: Mutex<Discovery>,
    listeners: RwLock<Vec<Arc<dyn MetricsListener>>>,
}

impl MetricsCollector {
    /// Create a collector using [`DEFAULT_PATTERN`].
    pub fn new(provider: Arc<dyn SourceProvider>) -> Result<Self, CollectorError> {
        Self::with_pattern(provider, DEFAULT_PATTERN)
    }

    /// Create a collector discovering entities matching `pattern`.
    pub fn with_pattern(
        provider: Arc<dyn SourceProvider>,
        pattern: &str,
    ) -> Result<Self, CollectorError> {
        Ok(Self {
            provider,
            pattern: pattern.parse()?,
            discovery: Mutex::new(Discovery::default()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// The discovery pattern.
    pub fn pattern(&self) -> &ObjectName {
        &self.pattern
    }

    /// Drop the cached source and entity handles, forcing rediscovery on
    /// the next poll.
    pub fn prepare(&self) {
        let mut discovery = self.discovery.lock();
        discovery.source = None;
        discovery.handles = None;
        discovery.generation = discovery.generation.wrapping_add(1);
        tracing::debug!(collector = COLLECTOR_NAME, "Discovery cache reset");
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Read every discovered entity once and return the batch.
    ///
    /// Entities whose read fails are left out of the batch.
    ///
    /// # Errors
    /// Returns `CollectorError::Discovery` if the source cannot be resolved
    /// or queried.
    pub async fn poll(&self) -> Result<Vec<EntitySnapshot>, CollectorError> {
        let handles = self.handles().await?;

        let mut batch = Vec::with_capacity(handles.len());
        for handle in &handles {
            match handle.statistics().await {
                Ok(slices) => batch.push(EntitySnapshot::from_object_name(handle.name(), slices)),
                Err(e) => {
                    tracing::warn!(entity = %handle.name(), error = %e, "Failed to read statistics, skipping entity");
                }
            }
        }
        Ok(batch)
    }

    async fn source(&self) -> Result<Arc<dyn StatisticsSource>, CollectorError> {
        let (cached, generation) = {
            let discovery = self.discovery.lock();
            (discovery.source.clone(), discovery.generation)
        };
        if let Some(source) = cached {
            return Ok(source);
        }
        let source = self
            .provider
            .resolve()
            .await
            .map_err(CollectorError::Discovery)?;
        {
            let mut discovery = self.discovery.lock();
            if discovery.generation == generation {
                discovery.source = Some(Arc::clone(&source));
            }
        }
        Ok(source)
    }

    async fn handles(&self) -> Result<Vec<Arc<dyn EntityHandle>>, CollectorError> {
        let (cached, generation) = {
            let discovery = self.discovery.lock();
            (discovery.handles.clone(), discovery.generation)
        };
        if let Some(handles) = cached {
            return Ok(handles);
        }
        let source = self.source().await?;
        let handles = source
            .query(&self.pattern)
            .await
            .map_err(CollectorError::Discovery)?;
        tracing::debug!(pattern = %self.pattern, count = handles.len(), "Discovered statistics sources");
        {
            let mut discovery = self.discovery.lock();
            if discovery.generation == generation {
                discovery.handles = Some(handles.clone());
            } else {
                tracing::debug!(collector = COLLECTOR_NAME, "Discovery reset during poll, not caching handles");
            }
        }
        Ok(handles)
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("pattern", &self.pattern.to_string())
            .field("listener_count", &self.listener_count())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl MetricsNotifier for MetricsCollector {
    fn register_listener(&self, listener: Arc<dyn MetricsListener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    fn deregister_listener(&self, listener: &Arc<dyn MetricsListener>) {
        self.listeners
            .write()
            .retain(|l| !same_listener(l, listener));
    }

    async fn notify_listeners(&self, batch: &[EntitySnapshot]) {
        // Registration may change while listeners run.
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_snapshot_batch(batch).await;
        }
    }
}

#[async_trait::async_trait]
impl Schedulable for MetricsCollector {
    fn name(&self) -> &str {
        COLLECTOR_NAME
    }

    async fn run(&self) {
        let start = Instant::now();
        tracing::debug!(collector = COLLECTOR_NAME, "Running collection");

        match self.poll().await {
            Ok(batch) => {
                self.notify_listeners(&batch).await;
                tracing::debug!(
                    collector = COLLECTOR_NAME,
                    entities = batch.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Collection succeeded"
                );
            }
            Err(e) => {
                tracing::warn!(collector = COLLECTOR_NAME, error = %e, "Error collecting message metrics, continuing");
            }
        }
    }
}
