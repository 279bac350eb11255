//! Turning raw CPU-stat samples into intervals.
//!
//! A raw sample looks like:
//!
//! ```json
//! {
//!     "timestamp": 1700000000.0,
//!     "duration": 1.0,
//!     "cpu": { "user": 120, "nice": 0, "system": 31, "idle": 740, ... },
//!     "cpu0": { "user": 60, ... }
//! }
//! ```
//!
//! Every key starting with `cpu` is one CPU; everything else besides
//! `timestamp` and `duration` is ignored.

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    results::Interval,
    utils::error::{PerfError, Result},
};

/// The unit every CPU-state interval is tagged with.
pub const CPU_TIME_UNIT: &str = "time units";

const CPU_KEY_PREFIX: &str = "cpu";

/// Channel name to interval, for one CPU at one sample point.
pub type CpuIntervals = IndexMap<String, Interval>;

/// CPU identifier to that CPU's intervals, in sample order.
pub type ParsedSample = IndexMap<String, CpuIntervals>;

fn number_field(sample: &serde_json::Map<String, Value>, key: &str) -> Result<f64> {
    match sample.get(key) {
        Some(value) => value.as_f64().ok_or_else(|| {
            PerfError::malformed(format!("'{key}' should be a number, got {value}"))
        }),
        None => Err(PerfError::malformed(format!("sample has no '{key}'"))),
    }
}

/// Parses one raw sample. Every produced interval shares the sample's
/// duration and timestamp.
pub fn parse_sample(sample: &Value) -> Result<ParsedSample> {
    let Some(sample) = sample.as_object() else {
        return Err(PerfError::malformed(format!(
            "a sample should be an object, got {sample}"
        )));
    };

    let duration = number_field(sample, "duration")?;
    let timestamp = number_field(sample, "timestamp")?;

    let mut parsed = ParsedSample::new();
    for (key, readings) in sample {
        if !key.starts_with(CPU_KEY_PREFIX) {
            continue;
        }

        parsed.insert(
            key.clone(),
            create_cpu_intervals(key, readings, duration, timestamp)?,
        );
    }

    Ok(parsed)
}

fn create_cpu_intervals(
    cpu: &str, readings: &Value, duration: f64, timestamp: f64,
) -> Result<CpuIntervals> {
    let Some(readings) = readings.as_object() else {
        return Err(PerfError::malformed(format!(
            "'{cpu}' should map states to readings, got {readings}"
        )));
    };

    readings
        .iter()
        .map(|(state, reading)| {
            let value = reading.as_f64().ok_or_else(|| {
                PerfError::malformed(format!(
                    "'{cpu}.{state}' should be a number, got {reading}"
                ))
            })?;

            let interval = Interval::new(value, duration, CPU_TIME_UNIT, timestamp)
                .map_err(|err| PerfError::malformed(format!("'{cpu}.{state}': {err}")))?;

            Ok((state.clone(), interval))
        })
        .collect()
}
