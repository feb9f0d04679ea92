//! Time slices and entity snapshots.

use serde::{Deserialize, Serialize};

use super::ObjectName;

/// Key property naming the adapter an entity belongs to.
pub const ADAPTER_PROPERTY: &str = "adapter";
/// Key property naming the channel an entity belongs to.
pub const CHANNEL_PROPERTY: &str = "channel";
/// Key property naming the workflow an entity belongs to.
pub const WORKFLOW_PROPERTY: &str = "workflow";
/// Key property carrying the unique statistic id.
pub const ID_PROPERTY: &str = "id";

/// A bounded window of message throughput.
///
/// A slice is *completed* once its end time has passed. Until then it is
/// *open* and its count may still grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlice {
    /// Slice start, milliseconds since the Unix epoch.
    pub start_millis: i64,
    /// Slice end, milliseconds since the Unix epoch.
    pub end_millis: i64,
    /// Messages counted in this slice.
    pub total_message_count: u64,
}

impl TimeSlice {
    /// Create a slice covering `[start_millis, end_millis]`.
    pub fn new(start_millis: i64, end_millis: i64, total_message_count: u64) -> Self {
        Self {
            start_millis,
            end_millis,
            total_message_count,
        }
    }

    /// Whether the slice had ended before `now_millis`.
    pub fn is_completed(&self, now_millis: i64) -> bool {
        self.end_millis < now_millis
    }

    /// Slice length in whole seconds. Inverted bounds count as zero.
    pub fn duration_secs(&self) -> u64 {
        if self.end_millis <= self.start_millis {
            return 0;
        }
        self.end_millis.abs_diff(self.start_millis) / 1000
    }
}

/// Composite adapter/channel/workflow path of an entity, used for labelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub adapter: Option<String>,
    pub channel: Option<String>,
    pub workflow: Option<String>,
}

impl EntityKey {
    /// Extract the path components from an entity's object name.
    pub fn from_object_name(name: &ObjectName) -> Self {
        Self {
            adapter: name.property(ADAPTER_PROPERTY).map(str::to_owned),
            channel: name.property(CHANNEL_PROPERTY).map(str::to_owned),
            workflow: name.property(WORKFLOW_PROPERTY).map(str::to_owned),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let part = |p: &Option<String>| p.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}/{}/{}",
            part(&self.adapter),
            part(&self.channel),
            part(&self.workflow)
        )
    }
}

/// Slices of one entity captured during a single poll.
///
/// Slices are ordered oldest-first. Only the last one may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Labelling path of the entity.
    pub key: EntityKey,
    /// Unique statistic id; drives deduplication and the exported metric name.
    pub statistic_id: String,
    /// Time slices, oldest first.
    pub slices: Vec<TimeSlice>,
}

impl EntitySnapshot {
    /// Create an empty snapshot for `statistic_id`.
    pub fn new(statistic_id: impl Into<String>) -> Self {
        Self {
            key: EntityKey::default(),
            statistic_id: statistic_id.into(),
            slices: Vec::new(),
        }
    }

    /// Build a snapshot from a discovered object name and its slices.
    pub fn from_object_name(name: &ObjectName, slices: Vec<TimeSlice>) -> Self {
        Self {
            key: EntityKey::from_object_name(name),
            statistic_id: name.property(ID_PROPERTY).unwrap_or_default().to_owned(),
            slices,
        }
    }

    /// Set the labelling path.
    pub fn with_key(mut self, key: EntityKey) -> Self {
        self.key = key;
        self
    }

    /// Append a slice at the newest end.
    pub fn with_slice(mut self, slice: TimeSlice) -> Self {
        self.slices.push(slice);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_completion() {
        let slice = TimeSlice::new(1_000, 2_000, 5);
        assert!(slice.is_completed(2_001));
        assert!(!slice.is_completed(2_000));
        assert!(!slice.is_completed(1_500));
    }

    #[test]
    fn test_slice_duration_truncates() {
        assert_eq!(TimeSlice::new(0, 2_999, 0).duration_secs(), 2);
        assert_eq!(TimeSlice::new(5_000, 4_000, 0).duration_secs(), 0);
    }

    #[test]
    fn test_slice_duration_extreme_bounds() {
        let slice: TimeSlice = serde_json::from_str(&format!(
            r#"{{"startMillis": {}, "endMillis": {}, "totalMessageCount": 1}}"#,
            i64::MIN,
            i64::MAX
        ))
        .unwrap();
        assert_eq!(slice.duration_secs(), u64::MAX / 1000);
        assert_eq!(TimeSlice::new(i64::MAX, i64::MIN, 0).duration_secs(), 0);
    }

    #[test]
    fn test_slice_json_field_names() {
        let slice: TimeSlice = serde_json::from_str(
            r#"{"startMillis": 10, "endMillis": 20, "totalMessageCount": 3}"#,
        )
        .unwrap();
        assert_eq!(slice, TimeSlice::new(10, 20, 3));
    }

    #[test]
    fn test_snapshot_from_object_name() {
        let name: ObjectName =
            "com.adaptris:type=Metrics,adapter=a1,channel=c1,workflow=w1,id=wf-stats"
                .parse()
                .unwrap();
        let snapshot = EntitySnapshot::from_object_name(&name, vec![TimeSlice::new(0, 1, 1)]);

        assert_eq!(snapshot.statistic_id, "wf-stats");
        assert_eq!(snapshot.key.to_string(), "a1/c1/w1");
        assert_eq!(snapshot.slices.len(), 1);
    }

    #[test]
    fn test_snapshot_builder() {
        let key = EntityKey {
            adapter: Some("a1".into()),
            channel: Some("c1".into()),
            workflow: None,
        };
        let snapshot = EntitySnapshot::new("wf-stats")
            .with_key(key.clone())
            .with_slice(TimeSlice::new(0, 1_000, 1))
            .with_slice(TimeSlice::new(1_000, 2_000, 2));

        assert_eq!(snapshot.statistic_id, "wf-stats");
        assert_eq!(snapshot.key, key);
        assert_eq!(snapshot.slices.last(), Some(&TimeSlice::new(1_000, 2_000, 2)));
        assert_eq!(snapshot.slices.len(), 2);
    }

    #[test]
    fn test_entity_key_display_missing_parts() {
        let key = EntityKey {
            adapter: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(key.to_string(), "a/-/-");
    }
}
