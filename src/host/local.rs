//! Running measurements on the machine perfstat itself runs on.

mod proc_stat;

use std::{
    path::PathBuf,
    process::Command,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde_json::{json, Value};

use super::{CommandOutput, Host, Job, JobLevel, Signal, Task};
use crate::utils::{
    cancellation_token::CancellationToken,
    error::{PerfError, Result},
};

const PROC_STAT_PATH: &str = "/proc/stat";

/// The local machine as a [`Host`].
#[derive(Debug, Clone)]
pub struct LocalHost {
    host_id: String,
    proc_stat: PathBuf,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new("localhost")
    }
}

impl LocalHost {
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
            proc_stat: PathBuf::from(PROC_STAT_PATH),
        }
    }

    /// Reads CPU state times from `path` instead of `/proc/stat`.
    pub fn with_proc_stat(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_stat = path.into();
        self
    }
}

impl Host for LocalHost {
    fn host_id(&self) -> &str {
        &self.host_id
    }

    fn run(&self, command: &str, level: JobLevel) -> Result<CommandOutput> {
        log::debug!("[{}] running {command:?} at {level:?}", self.host_id);

        let output = Command::new("sh").arg("-c").arg(command).output()?;
        Ok(CommandOutput {
            passed: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_background(&self, task: &Task, level: JobLevel) -> Result<Box<dyn Job>> {
        log::debug!("[{}] launching {task:?} at {level:?}", self.host_id);

        match task {
            Task::CpuStatMonitor { interval } => {
                cfg_if::cfg_if! {
                    if #[cfg(target_os = "linux")] {
                        Ok(Box::new(LocalJob::spawn_cpu_stat_monitor(
                            &self.host_id,
                            self.proc_stat.clone(),
                            *interval,
                        )?))
                    } else {
                        let _ = interval;
                        Err(PerfError::Unsupported(
                            "CPU state sampling needs /proc/stat, which only exists on Linux".into(),
                        ))
                    }
                }
            }
        }
    }
}

/// A background sampling thread on the local machine.
#[derive(Debug)]
pub struct LocalJob {
    host_id: String,
    token: Arc<CancellationToken>,
    handle: Option<JoinHandle<Vec<Value>>>,
    result: Option<Value>,
}

impl LocalJob {
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    fn spawn_cpu_stat_monitor(host_id: &str, path: PathBuf, interval: Duration) -> Result<Self> {
        // Read once up front so a missing file fails the launch rather than the wait.
        let first = proc_stat::read_proc_stat(&path)?;

        let token = Arc::new(CancellationToken::default());
        let handle = {
            let token = token.clone();
            thread::Builder::new()
                .name(format!("perfstat-cpu-{host_id}"))
                .spawn(move || monitor_cpu_stat(&path, first, interval, &token))?
        };

        Ok(Self {
            host_id: host_id.to_string(),
            token,
            handle: Some(handle),
            result: None,
        })
    }
}

impl Job for LocalJob {
    fn host_id(&self) -> &str {
        &self.host_id
    }

    fn kill(&mut self, signal: Signal) -> Result<()> {
        self.token.cancel();

        if signal == Signal::Kill && self.handle.take().is_some() {
            // Not waited for, so whatever it collected is dropped with it.
            log::debug!("[{}] killed sampling thread before reaping it", self.host_id);
        }

        Ok(())
    }

    fn wait(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let samples = handle
            .join()
            .map_err(|_| PerfError::GenericError("the sampling thread panicked".into()))?;

        self.result = Some(json!({ "data": samples }));
        Ok(())
    }

    fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

impl Drop for LocalJob {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Samples until cancelled. On cancellation the partial interval since the
/// last sample is flushed as one final, shorter sample. If the stat file
/// can no longer be read, sampling stops early and keeps what it has.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn monitor_cpu_stat(
    path: &std::path::Path, first: proc_stat::CpuTimes, interval: Duration,
    token: &CancellationToken,
) -> Vec<Value> {
    let mut samples = Vec::new();
    let mut prev = first;
    let mut prev_time = SystemTime::now();

    loop {
        let cancelled = token.sleep_with_cancellation(interval);

        let now = SystemTime::now();
        let curr = match proc_stat::read_proc_stat(path) {
            Ok(curr) => curr,
            Err(err) => {
                log::warn!(
                    "stopping CPU sampling, can't read {}: {err}",
                    path.display()
                );
                break;
            }
        };
        let duration = now.duration_since(prev_time).unwrap_or_default().as_secs_f64();

        if duration > 0.0 {
            samples.push(proc_stat::sample_from_delta(
                &prev,
                &curr,
                epoch_seconds(prev_time),
                duration,
            ));
        }

        prev = curr;
        prev_time = now;

        if cancelled {
            break;
        }
    }

    samples
}
