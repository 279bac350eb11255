//! A single channel's measurements over time.

use serde::Serialize;

use super::{Interval, PerfResult};
use crate::utils::error::{PerfError, Result};

/// An ordered, append-only run of [`Interval`]s.
///
/// Intervals are kept in append order and never re-sorted. Callers must
/// append in chronological order with no overlaps; the timestamps and
/// slicing rely on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SequentialResult {
    intervals: Vec<Interval>,
}

impl SequentialResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interval to the end.
    pub fn append(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    /// Appends every interval of `other`, which must start after this one
    /// ends.
    pub fn merge_with(&mut self, other: &SequentialResult) {
        self.intervals.extend(other.intervals.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Returns a new result holding only what overlaps `[start, end)`.
    /// Intervals that straddle a boundary are cut down (see
    /// [`Interval::time_slice`]).
    pub fn time_slice(&self, start: f64, end: f64) -> SequentialResult {
        let intervals = self
            .intervals
            .iter()
            .filter_map(|interval| interval.time_slice(start, end))
            .collect();

        SequentialResult { intervals }
    }
}

impl FromIterator<Interval> for SequentialResult {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        SequentialResult {
            intervals: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SequentialResult {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl PerfResult for SequentialResult {
    fn value(&self) -> f64 {
        self.intervals.iter().map(Interval::value).sum()
    }

    fn duration(&self) -> f64 {
        self.intervals.iter().map(Interval::duration).sum()
    }

    fn unit(&self) -> Option<&str> {
        self.intervals.first().map(Interval::unit)
    }

    fn start_timestamp(&self) -> Result<f64> {
        self.intervals
            .first()
            .map(Interval::timestamp)
            .ok_or_else(|| PerfError::undefined("start timestamp of an empty sequential result"))
    }

    fn end_timestamp(&self) -> Result<f64> {
        self.intervals
            .last()
            .map(Interval::end)
            .ok_or_else(|| PerfError::undefined("end timestamp of an empty sequential result"))
    }
}
