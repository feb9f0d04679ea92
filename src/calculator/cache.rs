//! Bounded history of processed slice keys.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

use crate::stats::TimeSlice;

/// Maximum number of slice keys remembered before the oldest is evicted.
pub const MAX_KEYS: usize = 1000;

/// Identity of one completed slice of one statistic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceKey {
    statistic_id: String,
    start_millis: i64,
    end_millis: i64,
}

impl SliceKey {
    /// Key for `slice` of the statistic `statistic_id`.
    pub fn new(statistic_id: &str, slice: &TimeSlice) -> Self {
        Self {
            statistic_id: statistic_id.to_owned(),
            start_millis: slice.start_millis,
            end_millis: slice.end_millis,
        }
    }
}

impl std::fmt::Display for SliceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.statistic_id, self.start_millis, self.end_millis
        )
    }
}

#[derive(Debug, Default)]
struct Entries {
    order: VecDeque<SliceKey>,
    keys: HashSet<SliceKey>,
}

/// Thread-safe FIFO set of slice keys with a hard size bound.
///
/// Membership test, eviction and insertion happen under one lock, so the
/// bound holds with any number of concurrent callers.
#[derive(Debug)]
pub struct ProcessedSliceCache {
    entries: Mutex<Entries>,
    capacity: usize,
}

impl Default for ProcessedSliceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessedSliceCache {
    /// Create a cache holding at most [`MAX_KEYS`] keys.
    pub fn new() -> Self {
        Self::with_capacity(MAX_KEYS)
    }

    /// Create a cache holding at most `capacity` keys (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Record `key` as processed.
    ///
    /// Returns `false` when the key was already present. At capacity the
    /// oldest-inserted key is evicted first.
    pub fn insert(&self, key: SliceKey) -> bool {
        let mut entries = self.entries.lock();
        if entries.keys.contains(&key) {
            return false;
        }
        while entries.order.len() >= self.capacity {
            if let Some(evicted) = entries.order.pop_front() {
                entries.keys.remove(&evicted);
            }
        }
        entries.order.push_back(key.clone());
        entries.keys.insert(key);
        true
    }

    /// Whether `key` has been processed.
    pub fn contains(&self, key: &SliceKey) -> bool {
        self.entries.lock().keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget every processed key.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.order.clear();
        entries.keys.clear();
    }
}
