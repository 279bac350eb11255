//! Measurements: background jobs across hosts, and the results they fold into.

pub mod stat_cpu;

use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    host::Host,
    results::ParallelResult,
    utils::error::Result,
};

/// Identifies which measurement (and which revision of its sample format)
/// produced a set of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MeasurementId {
    pub name: &'static str,
    pub version: &'static str,
}

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Where a [`Measurement`] is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MeasurementState {
    #[default]
    Idle,
    Running,
    Finished,
}

/// A measurement that runs background jobs on a set of hosts.
pub trait Measurement {
    type Results: MeasurementResults;

    fn id(&self) -> MeasurementId;

    /// The sample format version this measurement understands.
    fn version(&self) -> &'static str {
        self.id().version
    }

    fn hosts(&self) -> &[Arc<dyn Host>];

    /// Launches the background jobs. `Idle -> Running`.
    fn start(&mut self) -> Result<()>;

    /// Stops every job and captures its output. `Running -> Finished`.
    fn finish(&mut self) -> Result<()>;

    /// Builds results out of the finished jobs' output.
    fn collect_results(&self) -> Result<Vec<Self::Results>>;
}

/// Results bounded in time: they know their span and can be cut down to a
/// sub-range.
pub trait MeasurementResults: Sized {
    fn measurement(&self) -> MeasurementId;

    fn host(&self) -> &str;

    fn start_timestamp(&self) -> Result<f64>;

    fn end_timestamp(&self) -> Result<f64>;

    /// A new, independent copy holding only what overlaps `[start, end)`.
    fn time_slice(&self, start: f64, end: f64) -> Self;
}

/// Results for one CPU of one host.
pub trait CpuMeasurementResults: MeasurementResults {
    fn cpu(&self) -> &str;

    /// The CPU's busy time, one channel per non-idle state.
    fn utilization(&self) -> Result<ParallelResult>;
}
