//! Host configuration applied around a measurement.

pub mod turboboost;

pub use turboboost::DisableTurboboost;

use crate::utils::error::Result;

/// A piece of host configuration that is applied before a test and removed
/// after it.
pub trait SubConfiguration {
    fn apply(&self) -> Result<()>;

    /// Human-readable lines describing what the configuration does.
    fn describe(&self) -> Result<Vec<String>>;

    fn remove(&self) -> Result<()>;
}
