//! The seam between a measurement and the machines it runs on.
//!
//! How commands actually reach a host is up to the [`Host`] implementation;
//! measurements only need to launch background [`Job`]s, stop them, and read
//! what they produced.

pub mod local;

use std::{fmt::Debug, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use crate::utils::error::Result;

/// How loudly a job's outcome should be reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobLevel {
    /// Diagnostic only, not part of the reported results.
    #[default]
    Debug,
    Normal,
    Important,
}

/// A signal sent to a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Ask the job to stop and flush what it has.
    Interrupt,
    /// Stop the job now.
    Kill,
}

/// Work that can be launched as a background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Sample per-CPU state times every `interval`, producing one raw sample
    /// per interval.
    CpuStatMonitor { interval: Duration },
}

/// The outcome of a foreground command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub passed: bool,
    pub stdout: String,
    pub stderr: String,
}

/// A machine that can run commands and background tasks.
pub trait Host: Debug + Send + Sync {
    /// A stable identifier; measurements order hosts by it.
    fn host_id(&self) -> &str;

    /// Runs a command to completion.
    fn run(&self, command: &str, level: JobLevel) -> Result<CommandOutput>;

    /// Launches `task` in the background and returns a handle to it.
    fn run_background(&self, task: &Task, level: JobLevel) -> Result<Box<dyn Job>>;
}

/// A handle to a background process bound to one host.
///
/// Once [`Job::wait`] returns, [`Job::result`] holds the job's payload. For
/// monitoring tasks that is an object with the ordered samples under `data`.
pub trait Job: Debug + Send {
    /// The identifier of the host the job runs on.
    fn host_id(&self) -> &str;

    /// Sends a signal. Signalling a job that has already exited is not an
    /// error.
    fn kill(&mut self, signal: Signal) -> Result<()>;

    /// Blocks until the job exits.
    fn wait(&mut self) -> Result<()>;

    /// The captured payload, if the job finished and produced one.
    fn result(&self) -> Option<&Value>;
}
