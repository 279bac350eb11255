use std::{borrow::Cow, fmt, result};

use thiserror::Error;

/// A type alias for handling errors related to perfstat.
pub type Result<T> = result::Result<T, PerfError>;

/// An error that can occur while measuring or working with results.
#[derive(Debug, Error, PartialEq)]
pub enum PerfError {
    /// An interval was built with a negative or non-finite field.
    #[error("Invalid interval, {0}")]
    InvalidInterval(Cow<'static, str>),
    /// A parallel result was built with no channels or a repeated channel.
    #[error("Invalid composition, {0}")]
    InvalidComposition(Cow<'static, str>),
    /// A raw sample is missing its `duration`/`timestamp`, or a CPU entry
    /// holds something other than numeric readings.
    #[error("Malformed sample, {0}")]
    MalformedSample(Cow<'static, str>),
    /// A channel needed to build utilization was never observed.
    #[error("Missing channel '{channel}' for host '{host}', cpu '{cpu}'")]
    MissingChannel {
        host: String,
        cpu: String,
        channel: String,
    },
    /// A value was requested from a result that has no data.
    #[error("Undefined value, {0}")]
    Undefined(Cow<'static, str>),
    /// A measurement operation was called in the wrong lifecycle state.
    #[error("Invalid state, {0}")]
    InvalidState(Cow<'static, str>),
    /// One or more jobs could not be stopped cleanly.
    #[error("{}", JobFailures(.0))]
    JobControl(Vec<JobFailure>),
    /// The operation isn't supported on this platform.
    #[error("Unsupported, {0}")]
    Unsupported(Cow<'static, str>),
    /// An error when there is an IO exception.
    #[error("IO exception, {0}")]
    InvalidIo(String),
    /// An error to represent generic errors.
    #[error("Error, {0}")]
    GenericError(String),
}

impl PerfError {
    pub(crate) fn malformed<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        PerfError::MalformedSample(reason.into())
    }

    pub(crate) fn undefined<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        PerfError::Undefined(reason.into())
    }

    pub(crate) fn invalid_state<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        PerfError::InvalidState(reason.into())
    }
}

impl From<std::io::Error> for PerfError {
    fn from(err: std::io::Error) -> Self {
        PerfError::InvalidIo(err.to_string())
    }
}

/// What was being done to a job when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Interrupt,
    Wait,
    Kill,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobAction::Interrupt => write!(f, "interrupt"),
            JobAction::Wait => write!(f, "wait"),
            JobAction::Kill => write!(f, "kill"),
        }
    }
}

/// A single job-control failure seen while stopping a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub host: String,
    pub action: JobAction,
    pub reason: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to {} job on '{}': {}",
            self.action, self.host, self.reason
        )
    }
}

struct JobFailures<'a>(&'a [JobFailure]);

impl fmt::Display for JobFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job control error, {} failure(s)", self.0.len())?;
        for failure in self.0 {
            write!(f, "; {failure}")?;
        }

        Ok(())
    }
}
