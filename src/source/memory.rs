//! In-process statistics source.
//!
//! Holds entity slices in memory. Used when the host embeds the exporter
//! directly, and in tests, where availability can be toggled to exercise the
//! collector's failure handling.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::{EntityHandle, SourceError, SourceProvider, StatisticsSource};
use crate::stats::{ObjectName, ObjectNameError, TimeSlice};

#[derive(Debug, Default)]
struct Inner {
    entities: RwLock<BTreeMap<String, (ObjectName, Vec<TimeSlice>)>>,
    failing_reads: RwLock<HashSet<String>>,
    unavailable: AtomicBool,
    resolves: AtomicUsize,
    queries: AtomicUsize,
}

/// Shared, cloneable in-memory source. Clones see the same entities.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<Inner>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an entity with its slices.
    pub fn insert(&self, name: &str, slices: Vec<TimeSlice>) -> Result<(), ObjectNameError> {
        let parsed: ObjectName = name.parse()?;
        self.inner
            .entities
            .write()
            .insert(parsed.to_string(), (parsed, slices));
        Ok(())
    }

    /// Append a slice to an entity's newest end. Unknown names are ignored.
    pub fn push_slice(&self, name: &str, slice: TimeSlice) {
        let Ok(parsed) = name.parse::<ObjectName>() else {
            return;
        };
        if let Some((_, slices)) = self.inner.entities.write().get_mut(&parsed.to_string()) {
            slices.push(slice);
        }
    }

    /// Remove an entity.
    pub fn remove(&self, name: &str) {
        if let Ok(parsed) = name.parse::<ObjectName>() {
            self.inner.entities.write().remove(&parsed.to_string());
        }
    }

    /// Make resolution and discovery fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make reads of one entity fail until reset.
    pub fn set_read_failure(&self, name: &str, failing: bool) {
        let Ok(parsed) = name.parse::<ObjectName>() else {
            return;
        };
        let mut failing_reads = self.inner.failing_reads.write();
        if failing {
            failing_reads.insert(parsed.to_string());
        } else {
            failing_reads.remove(&parsed.to_string());
        }
    }

    /// Number of successful source resolutions so far.
    pub fn resolve_count(&self) -> usize {
        self.inner.resolves.load(Ordering::SeqCst)
    }

    /// Number of discovery queries so far, failed ones included.
    pub fn query_count(&self) -> usize {
        self.inner.queries.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), SourceError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("memory source disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SourceProvider for MemorySource {
    async fn resolve(&self) -> Result<Arc<dyn StatisticsSource>, SourceError> {
        self.check_available()?;
        self.inner.resolves.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait::async_trait]
impl StatisticsSource for MemorySource {
    async fn query(&self, pattern: &ObjectName) -> Result<Vec<Arc<dyn EntityHandle>>, SourceError> {
        self.inner.queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let entities = self.inner.entities.read();
        Ok(entities
            .values()
            .filter(|(name, _)| pattern.matches(name))
            .map(|(name, _)| {
                Arc::new(MemoryHandle {
                    name: name.clone(),
                    source: self.clone(),
                }) as Arc<dyn EntityHandle>
            })
            .collect())
    }
}

/// Handle to one entity of a [`MemorySource`].
#[derive(Debug)]
pub struct MemoryHandle {
    name: ObjectName,
    source: MemorySource,
}

#[async_trait::async_trait]
impl EntityHandle for MemoryHandle {
    fn name(&self) -> &ObjectName {
        &self.name
    }

    async fn statistics(&self) -> Result<Vec<TimeSlice>, SourceError> {
        let key = self.name.to_string();
        if self.source.inner.failing_reads.read().contains(&key) {
            return Err(SourceError::Unavailable(format!("read of '{key}' failed")));
        }
        self.source
            .inner
            .entities
            .read()
            .get(&key)
            .map(|(_, slices)| slices.clone())
            .ok_or(SourceError::NotFound(key))
    }
}
