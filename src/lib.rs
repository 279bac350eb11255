//! perfstat measures CPU utilization on a set of hosts.
//!
//! A [`measurement::stat_cpu::StatCpuMeasurement`] starts a background
//! CPU-stat monitor on every [`host::Host`], stops them all when asked, and
//! folds the raw per-interval samples into one
//! [`measurement::stat_cpu::StatCpuMeasurementResults`] per host and CPU.
//! Those results are built out of the composable time series in
//! [`results`], which can be accumulated, stacked side by side, and sliced
//! to any time range.

#![warn(rust_2018_idioms)]

pub mod utils {
    pub mod cancellation_token;
    pub mod error;
    pub mod logging;
}
pub mod constants;
pub mod host;
pub mod host_config;
pub mod measurement;
pub mod options;
pub mod results;

pub use utils::error::{PerfError, Result};
