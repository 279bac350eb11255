use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    measurement::{CpuMeasurementResults, MeasurementId, MeasurementResults},
    results::{Interval, ParallelResult, PerfResult, SequentialResult},
    utils::error::{PerfError, Result},
};

/// The kernel's CPU states, as named by the sampling agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuState {
    User,
    Nice,
    System,
    Idle,
    Iowait,
    Irq,
    Softirq,
    Steal,
    Guest,
    GuestNice,
}

impl CpuState {
    pub const fn as_str(self) -> &'static str {
        match self {
            CpuState::User => "user",
            CpuState::Nice => "nice",
            CpuState::System => "system",
            CpuState::Idle => "idle",
            CpuState::Iowait => "iowait",
            CpuState::Irq => "irq",
            CpuState::Softirq => "softirq",
            CpuState::Steal => "steal",
            CpuState::Guest => "guest",
            CpuState::GuestNice => "guest_nice",
        }
    }
}

/// The states that make up utilization, in order.
///
/// Guest time is already counted in user/nice by the kernel, so it is left out.
pub const UTILIZATION_STATES: [CpuState; 6] = [
    CpuState::User,
    CpuState::Nice,
    CpuState::System,
    CpuState::Irq,
    CpuState::Softirq,
    CpuState::Steal,
];

/// CPU-state time series for one CPU of one host.
///
/// Channels show up the first time they are observed and are never removed;
/// updates only ever append.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCpuMeasurementResults {
    measurement: MeasurementId,
    host: String,
    cpu: String,
    channels: IndexMap<String, SequentialResult>,
}

impl StatCpuMeasurementResults {
    pub fn new(
        measurement: MeasurementId, host: impl Into<String>, cpu: impl Into<String>,
    ) -> Self {
        Self {
            measurement,
            host: host.into(),
            cpu: cpu.into(),
            channels: IndexMap::new(),
        }
    }

    /// Appends one sample point's intervals, one per channel.
    pub fn update_intervals<I>(&mut self, intervals: I)
    where
        I: IntoIterator<Item = (String, Interval)>,
    {
        for (channel, interval) in intervals {
            self.channels.entry(channel).or_default().append(interval);
        }
    }

    pub fn channel(&self, name: &str) -> Option<&SequentialResult> {
        self.channels.get(name)
    }

    pub fn channels(&self) -> impl Iterator<Item = (&str, &SequentialResult)> {
        self.channels.iter().map(|(name, result)| (name.as_str(), result))
    }

    /// The share of observed time the CPU spent busy: utilization over
    /// utilization plus `idle` and `iowait`. [`None`] if no time was observed.
    pub fn busy_fraction(&self) -> Result<Option<f64>> {
        let busy = self.utilization()?.value();
        let waiting: f64 = [CpuState::Idle, CpuState::Iowait]
            .iter()
            .filter_map(|state| self.channel(state.as_str()))
            .map(PerfResult::value)
            .sum();

        let total = busy + waiting;
        Ok((total > 0.0).then(|| busy / total))
    }
}

impl MeasurementResults for StatCpuMeasurementResults {
    fn measurement(&self) -> MeasurementId {
        self.measurement
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn start_timestamp(&self) -> Result<f64> {
        self.channels
            .values()
            .filter_map(|result| result.start_timestamp().ok())
            .min_by(f64::total_cmp)
            .ok_or_else(|| {
                PerfError::undefined(format!(
                    "no data for host '{}', cpu '{}'",
                    self.host, self.cpu
                ))
            })
    }

    fn end_timestamp(&self) -> Result<f64> {
        self.channels
            .values()
            .filter_map(|result| result.end_timestamp().ok())
            .max_by(f64::total_cmp)
            .ok_or_else(|| {
                PerfError::undefined(format!(
                    "no data for host '{}', cpu '{}'",
                    self.host, self.cpu
                ))
            })
    }

    fn time_slice(&self, start: f64, end: f64) -> Self {
        Self {
            measurement: self.measurement,
            host: self.host.clone(),
            cpu: self.cpu.clone(),
            channels: self
                .channels
                .iter()
                .map(|(name, result)| (name.clone(), result.time_slice(start, end)))
                .collect(),
        }
    }
}

impl CpuMeasurementResults for StatCpuMeasurementResults {
    fn cpu(&self) -> &str {
        &self.cpu
    }

    /// Fails if any of [`UTILIZATION_STATES`] was never observed, which means
    /// the sampling agent left out a state it should report.
    fn utilization(&self) -> Result<ParallelResult> {
        let channels = UTILIZATION_STATES
            .iter()
            .map(|state| {
                let name = state.as_str();
                self.channels
                    .get(name)
                    .map(|result| (name, result.clone()))
                    .ok_or_else(|| PerfError::MissingChannel {
                        host: self.host.clone(),
                        cpu: self.cpu.clone(),
                        channel: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        ParallelResult::new(channels)
    }
}
