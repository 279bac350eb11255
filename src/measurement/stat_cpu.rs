//! CPU utilization from per-state CPU time, sampled on every host.

mod results;
mod sample;

pub use results::{CpuState, StatCpuMeasurementResults, UTILIZATION_STATES};
pub use sample::{parse_sample, CpuIntervals, ParsedSample, CPU_TIME_UNIT};

use std::{mem, sync::Arc, time::Duration};

use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;

use super::{Measurement, MeasurementId, MeasurementState};
use crate::{
    constants::DEFAULT_SAMPLE_INTERVAL,
    host::{Host, Job, JobLevel, Signal, Task},
    utils::error::{JobAction, JobFailure, PerfError, Result},
};

const STAT_CPU_ID: MeasurementId = MeasurementId {
    name: "stat_cpu",
    version: "1",
};

/// Runs a CPU-stat monitor on every host and folds the samples into one
/// [`StatCpuMeasurementResults`] per host and CPU.
///
/// The lifecycle is `Idle -> Running -> Finished`; [`StatCpuMeasurement::reset`]
/// goes back to `Idle`.
#[derive(Debug)]
pub struct StatCpuMeasurement {
    hosts: Vec<Arc<dyn Host>>,
    interval: Duration,
    job_level: JobLevel,
    state: MeasurementState,
    running_jobs: Vec<Box<dyn Job>>,
    finished_jobs: Vec<Box<dyn Job>>,
}

impl StatCpuMeasurement {
    pub fn new(hosts: Vec<Arc<dyn Host>>) -> Self {
        Self {
            hosts,
            interval: DEFAULT_SAMPLE_INTERVAL,
            job_level: JobLevel::default(),
            state: MeasurementState::Idle,
            running_jobs: Vec::new(),
            finished_jobs: Vec::new(),
        }
    }

    /// Sets how often the monitors sample.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the level the monitoring jobs are reported at.
    pub fn with_job_level(mut self, job_level: JobLevel) -> Self {
        self.job_level = job_level;
        self
    }

    pub fn state(&self) -> MeasurementState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Drops the finished jobs and goes back to `Idle`.
    pub fn reset(&mut self) -> Result<()> {
        match self.state {
            MeasurementState::Running => Err(PerfError::invalid_state(
                "can't reset a running measurement, finish it first",
            )),
            _ => {
                self.finished_jobs.clear();
                self.state = MeasurementState::Idle;
                Ok(())
            }
        }
    }

    /// Like [`Measurement::collect_results`], but keeps going past jobs whose
    /// output can't be parsed.
    ///
    /// Returns the results of every job that parsed cleanly, along with one
    /// error per job that didn't. A job's results are dropped entirely at its
    /// first malformed sample.
    pub fn collect_partial_results(
        &self,
    ) -> Result<(Vec<StatCpuMeasurementResults>, Vec<PerfError>)> {
        if self.state != MeasurementState::Finished {
            return Err(PerfError::invalid_state(
                "results can only be collected from a finished measurement",
            ));
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();

        for job in &self.finished_jobs {
            match self.process_job(job.as_ref()) {
                Ok(job_results) => results.extend(job_results),
                Err(err) => {
                    log::warn!("[{}] dropping results: {err}", job.host_id());
                    errors.push(err);
                }
            }
        }

        log::info!(
            "collected {} CPU result(s) from {} job(s), {} failed",
            results.len(),
            self.finished_jobs.len(),
            errors.len()
        );

        Ok((results, errors))
    }

    fn process_job(&self, job: &dyn Job) -> Result<Vec<StatCpuMeasurementResults>> {
        let host = job.host_id();
        let mut job_results: IndexMap<String, StatCpuMeasurementResults> = IndexMap::new();

        for sample in job_samples(job)? {
            let parsed = parse_sample(sample)?;

            // A zero-length sample covers no time, so no slice of the span
            // could hand it back.
            if parsed
                .values()
                .flat_map(|intervals| intervals.values())
                .any(|interval| interval.duration() == 0.0)
            {
                log::debug!("[{host}] skipping zero-length sample");
                continue;
            }

            for (cpu, cpu_intervals) in parsed {
                job_results
                    .entry(cpu)
                    .or_insert_with_key(|cpu| {
                        StatCpuMeasurementResults::new(STAT_CPU_ID, host, cpu.as_str())
                    })
                    .update_intervals(cpu_intervals);
            }
        }

        Ok(job_results.into_values().collect())
    }
}

/// The samples a job left under `data`. A job that was killed before it could
/// report has none.
fn job_samples(job: &dyn Job) -> Result<&[Value]> {
    let Some(payload) = job.result() else {
        log::debug!("[{}] job left no output", job.host_id());
        return Ok(&[]);
    };

    match payload.get("data") {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(samples)) => Ok(samples),
        Some(other) => Err(PerfError::malformed(format!(
            "job output on '{}' should hold a list of samples, got {other}",
            job.host_id()
        ))),
    }
}

/// Owns jobs that are being stopped, and makes sure every one of them gets a
/// hard kill on the way out, including when unwinding.
struct JobReaper {
    jobs: Vec<Box<dyn Job>>,
    failures: Vec<JobFailure>,
    reaped: bool,
}

impl JobReaper {
    fn new(jobs: Vec<Box<dyn Job>>) -> Self {
        Self {
            jobs,
            failures: Vec::new(),
            reaped: false,
        }
    }

    fn record(&mut self, host: &str, action: JobAction, err: PerfError) {
        log::warn!("[{host}] failed to {action} monitoring job: {err}");
        self.failures.push(JobFailure {
            host: host.to_string(),
            action,
            reason: err.to_string(),
        });
    }

    /// Interrupts each job and waits for it to exit. A failure on one job
    /// doesn't stop the others from being stopped.
    fn interrupt_and_wait(&mut self) {
        for index in 0..self.jobs.len() {
            let job = &mut self.jobs[index];
            let host = job.host_id().to_string();

            if let Err(err) = job.kill(Signal::Interrupt) {
                self.record(&host, JobAction::Interrupt, err);
                continue;
            }

            let job = &mut self.jobs[index];
            if let Err(err) = job.wait() {
                self.record(&host, JobAction::Wait, err);
            } else {
                log::debug!("[{host}] monitoring job stopped");
            }
        }
    }

    fn kill_all(&mut self) {
        if self.reaped {
            return;
        }
        self.reaped = true;

        for index in 0..self.jobs.len() {
            let job = &mut self.jobs[index];
            let host = job.host_id().to_string();

            if let Err(err) = job.kill(Signal::Kill) {
                self.record(&host, JobAction::Kill, err);
            }
        }
    }

    /// Hands the jobs back without killing them.
    fn disarm(mut self) -> Vec<Box<dyn Job>> {
        self.reaped = true;
        mem::take(&mut self.jobs)
    }

    /// Kills everything and hands the jobs back with what went wrong.
    fn reap(mut self) -> (Vec<Box<dyn Job>>, Vec<JobFailure>) {
        self.kill_all();
        (mem::take(&mut self.jobs), mem::take(&mut self.failures))
    }
}

impl Drop for JobReaper {
    fn drop(&mut self) {
        self.kill_all();
    }
}

impl Measurement for StatCpuMeasurement {
    type Results = StatCpuMeasurementResults;

    fn id(&self) -> MeasurementId {
        STAT_CPU_ID
    }

    fn hosts(&self) -> &[Arc<dyn Host>] {
        &self.hosts
    }

    /// Launches one monitor per host, in host-id order. If any launch fails,
    /// the monitors launched so far are killed and the measurement stays
    /// `Idle`.
    fn start(&mut self) -> Result<()> {
        if self.state != MeasurementState::Idle {
            return Err(PerfError::invalid_state(format!(
                "can only start an idle measurement, this one is {:?}",
                self.state
            )));
        }

        let task = Task::CpuStatMonitor {
            interval: self.interval,
        };

        let mut reaper = JobReaper::new(Vec::with_capacity(self.hosts.len()));
        for host in self.hosts.iter().sorted_by(|a, b| a.host_id().cmp(b.host_id())) {
            let job = host.run_background(&task, self.job_level)?;
            log::debug!("[{}] started {} monitor", host.host_id(), STAT_CPU_ID);
            reaper.jobs.push(job);
        }

        self.running_jobs = reaper.disarm();
        self.state = MeasurementState::Running;

        Ok(())
    }

    /// Interrupts every job and waits for it, then hard-kills all of them no
    /// matter what happened. The measurement is `Finished` afterwards even if
    /// some jobs failed; those failures come back together as one
    /// [`PerfError::JobControl`].
    fn finish(&mut self) -> Result<()> {
        if self.state != MeasurementState::Running {
            return Err(PerfError::invalid_state(format!(
                "can only finish a running measurement, this one is {:?}",
                self.state
            )));
        }

        self.state = MeasurementState::Finished;
        let mut reaper = JobReaper::new(mem::take(&mut self.running_jobs));
        reaper.interrupt_and_wait();

        let (jobs, failures) = reaper.reap();
        self.finished_jobs = jobs;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PerfError::JobControl(failures))
        }
    }

    /// Parses every finished job's samples. The first job with malformed
    /// output fails the whole collection; see
    /// [`StatCpuMeasurement::collect_partial_results`] to keep the rest.
    fn collect_results(&self) -> Result<Vec<StatCpuMeasurementResults>> {
        let (results, errors) = self.collect_partial_results()?;

        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }
}
