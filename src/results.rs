//! Time-series performance results.
//!
//! Results compose in two directions:
//! - [`SequentialResult`] chains [`Interval`]s of one channel one after
//!   another in time.
//! - [`ParallelResult`] stacks several [`SequentialResult`]s that were active
//!   over the same window, e.g. the per-state CPU time channels.
//!
//! Every kind can be cut down to a time range with `time_slice`, which keeps
//! the per-interval boundaries intact.

pub mod interval;
pub mod parallel;
pub mod sequential;

pub use interval::Interval;
pub use parallel::ParallelResult;
pub use sequential::SequentialResult;

use crate::utils::error::Result;

/// The read-only surface shared by every result kind.
pub trait PerfResult {
    /// The accumulated value.
    fn value(&self) -> f64;

    /// The covered duration.
    fn duration(&self) -> f64;

    /// The unit of [`PerfResult::value`], if there is any data to have one.
    fn unit(&self) -> Option<&str>;

    /// When the result starts. Fails if there is no data.
    fn start_timestamp(&self) -> Result<f64>;

    /// When the result ends. Fails if there is no data.
    fn end_timestamp(&self) -> Result<f64>;

    /// The value per unit of duration.
    fn average(&self) -> f64 {
        let duration = self.duration();
        if duration > 0.0 {
            self.value() / duration
        } else {
            0.0
        }
    }
}
