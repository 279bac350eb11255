//! The atomic measurement.

use serde::Serialize;

use super::PerfResult;
use crate::utils::error::{PerfError, Result};

/// A scalar value observed over a duration, anchored at a timestamp.
///
/// The value is treated as accumulated over the duration (a rate-like
/// quantity, e.g. CPU time spent in one state), which is what lets an
/// interval be cut into smaller pieces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    value: f64,
    duration: f64,
    unit: String,
    timestamp: f64,
}

impl Interval {
    /// Creates a new [`Interval`]. Fails if `duration` is negative or if any
    /// of the numeric fields are not finite.
    pub fn new(value: f64, duration: f64, unit: impl Into<String>, timestamp: f64) -> Result<Self> {
        if !value.is_finite() || !duration.is_finite() || !timestamp.is_finite() {
            return Err(PerfError::InvalidInterval(
                format!("value {value}, duration {duration} and timestamp {timestamp} must be finite")
                    .into(),
            ));
        }

        if duration < 0.0 {
            return Err(PerfError::InvalidInterval(
                format!("duration must not be negative, got {duration}").into(),
            ));
        }

        Ok(Self {
            value,
            duration,
            unit: unit.into(),
            timestamp,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// `timestamp + duration`.
    pub fn end(&self) -> f64 {
        self.timestamp + self.duration
    }

    /// The value per unit of duration. Zero-duration intervals report 0.
    pub fn average(&self) -> f64 {
        if self.duration > 0.0 {
            self.value / self.duration
        } else {
            0.0
        }
    }

    /// Returns the part of this interval that overlaps `[start, end)`, or
    /// [`None`] if nothing overlaps.
    ///
    /// A partially covered interval keeps only the overlapping duration, and
    /// its value is scaled by the covered fraction. Zero-duration intervals
    /// are kept as-is if their timestamp lies within the range, so one sitting
    /// exactly at `end` is left out. A NaN bound selects nothing.
    pub fn time_slice(&self, start: f64, end: f64) -> Option<Interval> {
        if start.is_nan() || end.is_nan() {
            return None;
        }

        if self.duration == 0.0 {
            return (start <= self.timestamp && self.timestamp < end).then(|| self.clone());
        }

        let new_start = start.max(self.timestamp);
        let new_end = end.min(self.end());
        if new_end <= new_start {
            return None;
        }

        if new_start == self.timestamp && new_end == self.end() {
            return Some(self.clone());
        }

        let new_duration = new_end - new_start;
        Some(Interval {
            value: self.value * (new_duration / self.duration),
            duration: new_duration,
            unit: self.unit.clone(),
            timestamp: new_start,
        })
    }
}

impl PerfResult for Interval {
    fn value(&self) -> f64 {
        self.value
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn unit(&self) -> Option<&str> {
        Some(&self.unit)
    }

    fn start_timestamp(&self) -> Result<f64> {
        Ok(self.timestamp)
    }

    fn end_timestamp(&self) -> Result<f64> {
        Ok(self.end())
    }
}
