//! Channels measured side by side over the same window.

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use super::{PerfResult, SequentialResult};
use crate::utils::error::{PerfError, Result};

/// A fixed, ordered set of named [`SequentialResult`]s that are assumed to
/// cover the same span of time.
///
/// The set of channels is decided at construction and can't grow or shrink
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParallelResult {
    channels: IndexMap<String, SequentialResult>,
}

impl ParallelResult {
    /// Creates a new [`ParallelResult`] from `(name, result)` pairs, keeping
    /// their order. Fails if there are no channels or if a name repeats.
    pub fn new<S, I>(channels: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, SequentialResult)>,
    {
        let mut map = IndexMap::new();

        for (name, result) in channels {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(PerfError::InvalidComposition(
                    format!("channel '{name}' was given more than once").into(),
                ));
            }
            map.insert(name, result);
        }

        if map.is_empty() {
            return Err(PerfError::InvalidComposition(
                "a parallel result needs at least one channel".into(),
            ));
        }

        Ok(Self { channels: map })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// A constructed result always has at least one channel.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel(&self, name: &str) -> Option<&SequentialResult> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn channels(&self) -> impl Iterator<Item = (&str, &SequentialResult)> {
        self.channels.iter().map(|(name, result)| (name.as_str(), result))
    }

    /// Slices every channel to `[start, end)`. The returned result has the
    /// same channels in the same order.
    pub fn time_slice(&self, start: f64, end: f64) -> ParallelResult {
        let channels = self
            .channels
            .iter()
            .map(|(name, result)| (name.clone(), result.time_slice(start, end)))
            .collect();

        ParallelResult { channels }
    }
}

impl PerfResult for ParallelResult {
    /// The sum across channels.
    fn value(&self) -> f64 {
        self.channels.values().map(PerfResult::value).sum()
    }

    /// The longest channel duration.
    fn duration(&self) -> f64 {
        self.channels
            .values()
            .map(PerfResult::duration)
            .fold(0.0, f64::max)
    }

    fn unit(&self) -> Option<&str> {
        self.channels.values().find_map(PerfResult::unit)
    }

    fn start_timestamp(&self) -> Result<f64> {
        self.channels
            .values()
            .filter_map(|result| result.start_timestamp().ok())
            .minmax_by(f64::total_cmp)
            .into_option()
            .map(|(min, _)| min)
            .ok_or_else(|| PerfError::undefined("start timestamp of an empty parallel result"))
    }

    fn end_timestamp(&self) -> Result<f64> {
        self.channels
            .values()
            .filter_map(|result| result.end_timestamp().ok())
            .minmax_by(f64::total_cmp)
            .into_option()
            .map(|(_, max)| max)
            .ok_or_else(|| PerfError::undefined("end timestamp of an empty parallel result"))
    }

    /// The sum of every channel's average.
    fn average(&self) -> f64 {
        self.channels.values().map(PerfResult::average).sum()
    }
}
