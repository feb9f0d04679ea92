//! Backward-scan rate calculation.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cache::{ProcessedSliceCache, SliceKey};
use crate::stats::EntitySnapshot;

/// Errors raised by the rate calculator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculatorError {
    /// The evaluation window must be at least one second.
    #[error("invalid window: {0}s (must be positive)")]
    InvalidWindow(u64),
}

/// Outcome of one rate calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    /// Nothing new to report; exporters emit nothing.
    NoData,
    /// Previously reported throughput has stopped.
    Zero,
    /// Messages counted in newly completed slices.
    Count(u64),
}

impl Rate {
    /// Integer encoding: `-1` for no data, `0` for zero, otherwise the count.
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::NoData => -1,
            Self::Zero => 0,
            Self::Count(n) => i64::try_from(*n).unwrap_or(i64::MAX),
        }
    }

    /// Value to export, or `None` when nothing should be emitted.
    pub fn reportable(&self) -> Option<u64> {
        match self {
            Self::NoData => None,
            Self::Zero => Some(0),
            Self::Count(n) => Some(*n),
        }
    }
}

/// How a confirmed-zero boundary is reported on repeated polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroReport {
    /// Report [`Rate::Zero`] every time the boundary is reached.
    #[default]
    EveryPoll,
    /// Report [`Rate::Zero`] once per boundary slice, then [`Rate::NoData`].
    Once,
}

/// Computes per-entity message counts from completed time slices.
///
/// Each completed slice is counted at most once across calls; the set of
/// counted slices lives in a [`ProcessedSliceCache`] which may be shared
/// between calculators.
#[derive(Debug, Default)]
pub struct RateCalculator {
    processed: Arc<ProcessedSliceCache>,
    zero_reported: ProcessedSliceCache,
    zero_report: ZeroReport,
}

impl RateCalculator {
    /// Create a calculator with its own cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator over a shared cache.
    pub fn with_cache(processed: Arc<ProcessedSliceCache>) -> Self {
        Self {
            processed,
            ..Self::default()
        }
    }

    /// Set the zero reporting policy.
    pub fn with_zero_report(mut self, zero_report: ZeroReport) -> Self {
        self.zero_report = zero_report;
        self
    }

    /// The processed-slice cache.
    pub fn cache(&self) -> &Arc<ProcessedSliceCache> {
        &self.processed
    }

    /// Forget all processed slices.
    pub fn clear(&self) {
        self.processed.clear();
        self.zero_reported.clear();
    }

    /// Calculate the rate for `snapshot` against the wall clock.
    pub fn calculate_rate(
        &self,
        window_secs: u64,
        snapshot: &EntitySnapshot,
    ) -> Result<Rate, CalculatorError> {
        self.calculate_rate_at(window_secs, snapshot, Utc::now().timestamp_millis())
    }

    /// Calculate the rate for `snapshot` as of `now_millis`.
    ///
    /// Slices are scanned newest to oldest. Open slices are skipped. New
    /// completed slices are summed until an already processed slice is met
    /// or the summed slice durations exceed `window_secs`.
    ///
    /// [`Rate::Zero`] means the oldest slice was reached already processed
    /// with nothing new before it. If new slices were summed first, their
    /// count is returned rather than being replaced by zero.
    ///
    /// # Errors
    /// Returns `CalculatorError::InvalidWindow` if `window_secs` is zero.
    pub fn calculate_rate_at(
        &self,
        window_secs: u64,
        snapshot: &EntitySnapshot,
        now_millis: i64,
    ) -> Result<Rate, CalculatorError> {
        if window_secs == 0 {
            return Err(CalculatorError::InvalidWindow(window_secs));
        }

        let mut total: Option<u64> = None;
        let mut tallied_secs: u64 = 0;

        for (index, slice) in snapshot.slices.iter().enumerate().rev() {
            if !slice.is_completed(now_millis) {
                continue;
            }

            let key = SliceKey::new(&snapshot.statistic_id, slice);
            if !self.processed.insert(key.clone()) {
                // Everything older was counted on an earlier call.
                if index == 0 && total.is_none() {
                    return Ok(self.boundary_reached(key));
                }
                break;
            }

            tracing::trace!(
                statistic = %snapshot.statistic_id,
                count = slice.total_message_count,
                end_millis = slice.end_millis,
                "Adding time slice"
            );
            total = Some(
                total
                    .unwrap_or(0)
                    .saturating_add(slice.total_message_count),
            );
            tallied_secs = tallied_secs.saturating_add(slice.duration_secs());

            if tallied_secs > window_secs {
                break;
            }
        }

        Ok(total.map_or(Rate::NoData, Rate::Count))
    }

    fn boundary_reached(&self, oldest: SliceKey) -> Rate {
        match self.zero_report {
            ZeroReport::EveryPoll => Rate::Zero,
            ZeroReport::Once if self.zero_reported.insert(oldest) => Rate::Zero,
            ZeroReport::Once => Rate::NoData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::MAX_KEYS;
    use crate::stats::TimeSlice;

    const NOW: i64 = 1_700_000_000_000;
    const FIVE_SECONDS: i64 = 5_000;
    const TWO_SECONDS: i64 = 2_000;

    /// Slice ending `ended_ago` millis before NOW, lasting `len` millis.
    fn slice(ended_ago: i64, len: i64, count: u64) -> TimeSlice {
        TimeSlice::new(NOW - ended_ago - len, NOW - ended_ago, count)
    }

    fn snapshot(slices: Vec<TimeSlice>) -> EntitySnapshot {
        EntitySnapshot {
            statistic_id: "MyStatId".to_string(),
            slices,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_slices() {
        let calc = RateCalculator::new();
        for window in [1, 10, 3600] {
            assert_eq!(
                calc.calculate_rate_at(window, &snapshot(vec![]), NOW),
                Ok(Rate::NoData)
            );
        }
    }

    #[test]
    fn test_only_open_slices() {
        let calc = RateCalculator::new();
        let snap = snapshot(vec![slice(-FIVE_SECONDS, TWO_SECONDS, 7)]);
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::NoData));
        assert!(calc.cache().is_empty());
    }

    #[test]
    fn test_zero_window_rejected() {
        let calc = RateCalculator::new();
        assert_eq!(
            calc.calculate_rate_at(0, &snapshot(vec![]), NOW),
            Err(CalculatorError::InvalidWindow(0))
        );
    }

    #[test]
    fn test_single_completed_slice() {
        let calc = RateCalculator::new();
        let snap = snapshot(vec![slice(FIVE_SECONDS, TWO_SECONDS, 10)]);
        assert_eq!(calc.calculate_rate_at(1, &snap, NOW), Ok(Rate::Count(10)));
    }

    #[test]
    fn test_sums_new_slices_within_window() {
        let calc = RateCalculator::new();
        let snap = snapshot(vec![
            slice(FIVE_SECONDS, TWO_SECONDS, 15),
            slice(TWO_SECONDS, TWO_SECONDS, 20),
        ]);
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(35)));
    }

    #[test]
    fn test_open_newest_slice_is_skipped() {
        let calc = RateCalculator::new();
        let snap = snapshot(vec![
            slice(FIVE_SECONDS, TWO_SECONDS, 15),
            slice(-TWO_SECONDS, FIVE_SECONDS, 99),
        ]);
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(15)));
    }

    #[test]
    fn test_window_stops_scan() {
        let calc = RateCalculator::new();
        let oldest = slice(20_000, FIVE_SECONDS, 100);
        let snap = snapshot(vec![
            oldest,
            slice(10_000, FIVE_SECONDS, 3),
            slice(1_000, FIVE_SECONDS, 4),
        ]);
        // The second slice takes the tally to 10s, past the 6s window.
        assert_eq!(calc.calculate_rate_at(6, &snap, NOW), Ok(Rate::Count(7)));
        assert!(
            !calc
                .cache()
                .contains(&SliceKey::new("MyStatId", &oldest))
        );
    }

    #[test]
    fn test_repeat_poll_confirms_zero_every_time() {
        let calc = RateCalculator::new();
        let snap = snapshot(vec![slice(FIVE_SECONDS, TWO_SECONDS, 10)]);

        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(10)));
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Zero));
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Zero));
    }

    #[test]
    fn test_zero_once_then_no_data() {
        let calc = RateCalculator::new().with_zero_report(ZeroReport::Once);
        let snap = snapshot(vec![slice(FIVE_SECONDS, TWO_SECONDS, 10)]);

        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(10)));
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Zero));
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::NoData));
    }

    #[test]
    fn test_processed_newest_slice_is_no_data() {
        let calc = RateCalculator::new();
        let snap = snapshot(vec![
            slice(FIVE_SECONDS * 3, TWO_SECONDS, 10),
            slice(FIVE_SECONDS, TWO_SECONDS, 12),
        ]);
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(22)));
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::NoData));
    }

    #[test]
    fn test_only_new_slices_counted_after_append() {
        let calc = RateCalculator::new();
        let mut snap = snapshot(vec![slice(FIVE_SECONDS * 3, TWO_SECONDS, 10)]);
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(10)));

        snap.slices.push(slice(FIVE_SECONDS, TWO_SECONDS, 12));
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(12)));

        snap.slices.push(slice(-FIVE_SECONDS, TWO_SECONDS, 6));
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::NoData));
    }

    #[test]
    fn test_open_slice_counted_once_completed() {
        let calc = RateCalculator::new();
        let open = TimeSlice::new(NOW - 1_000, NOW + 1_000, 4);
        let snap = snapshot(vec![open]);

        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::NoData));
        assert_eq!(
            calc.calculate_rate_at(10, &snap, NOW + 2_000),
            Ok(Rate::Count(4))
        );
    }

    #[test]
    fn test_statistics_are_isolated_by_id() {
        let calc = RateCalculator::new();
        let s = slice(FIVE_SECONDS, TWO_SECONDS, 10);
        let a = snapshot(vec![s]);
        let mut b = snapshot(vec![s]);
        b.statistic_id = "Other".to_string();

        assert_eq!(calc.calculate_rate_at(10, &a, NOW), Ok(Rate::Count(10)));
        assert_eq!(calc.calculate_rate_at(10, &b, NOW), Ok(Rate::Count(10)));
    }

    #[test]
    fn test_shared_cache_bounded() {
        let cache = Arc::new(ProcessedSliceCache::new());
        let calc = RateCalculator::with_cache(Arc::clone(&cache));
        for n in 0..1_200 {
            let mut snap = snapshot(vec![slice(FIVE_SECONDS, TWO_SECONDS, 1)]);
            snap.statistic_id = format!("stat-{n}");
            calc.calculate_rate_at(10, &snap, NOW).unwrap();
        }
        assert_eq!(cache.len(), MAX_KEYS);
    }

    #[test]
    fn test_clear_allows_recount() {
        let calc = RateCalculator::new();
        let snap = snapshot(vec![slice(FIVE_SECONDS, TWO_SECONDS, 10)]);
        calc.calculate_rate_at(10, &snap, NOW).unwrap();
        calc.clear();
        assert_eq!(calc.calculate_rate_at(10, &snap, NOW), Ok(Rate::Count(10)));
    }

    #[test]
    fn test_rate_encoding() {
        assert_eq!(Rate::NoData.as_i64(), -1);
        assert_eq!(Rate::Zero.as_i64(), 0);
        assert_eq!(Rate::Count(35).as_i64(), 35);
        assert_eq!(Rate::NoData.reportable(), None);
        assert_eq!(Rate::Zero.reportable(), Some(0));
    }
}
