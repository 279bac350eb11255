use std::{
    ffi::OsString,
    path::Path,
    process::Command,
    sync::{Arc, Mutex},
};

use perfstat::{
    host::{CommandOutput, Host, Job, JobLevel, Signal, Task},
    PerfError, Result,
};
use serde_json::{json, Value};

pub fn abs_path(path: &str) -> OsString {
    let path = Path::new(path);

    if path.exists() {
        path.canonicalize().unwrap().into_os_string()
    } else {
        // We are going to trust that the path given is valid...
        path.to_owned().into_os_string()
    }
}

const PERFSTAT_EXE_PATH: &str = env!("CARGO_BIN_EXE_perfstat");
const DEFAULT_CFG: [&str; 2] = ["-C", "./tests/valid_configs/empty_config.toml"];

/// Returns the [`Command`] of a binary invocation of perfstat.
pub fn perfstat_command(args: &[&str]) -> Command {
    let mut cmd = Command::new(PERFSTAT_EXE_PATH);

    let mut prev = "";
    for arg in args.iter() {
        if prev == "-C" {
            // This is the config file; make sure we set it to absolute path!
            cmd.arg(abs_path(arg));
        } else {
            cmd.arg(arg);
        }

        prev = arg;
    }

    cmd
}

/// Returns the [`Command`] of a binary invocation of perfstat with the
/// default, empty config file.
pub fn no_cfg_perfstat_command() -> Command {
    perfstat_command(&DEFAULT_CFG)
}

/// Every signal sent to a fake job, tagged with the job's host.
pub type SignalLog = Arc<Mutex<Vec<(String, Signal)>>>;

/// A host whose monitoring jobs replay a fixed payload.
#[derive(Debug)]
pub struct FakeHost {
    id: String,
    payload: Option<Value>,
    fail_launch: bool,
    fail_wait: bool,
    failing_signals: Vec<Signal>,
    signals: SignalLog,
}

impl FakeHost {
    pub fn new(id: &str, signals: &SignalLog) -> Self {
        Self {
            id: id.to_string(),
            payload: None,
            fail_launch: false,
            fail_wait: false,
            failing_signals: Vec::new(),
            signals: signals.clone(),
        }
    }

    /// The samples the job reports once it has been waited on.
    pub fn with_samples(mut self, samples: Vec<Value>) -> Self {
        self.payload = Some(json!({ "data": samples }));
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn failing_wait(mut self) -> Self {
        self.fail_wait = true;
        self
    }

    /// The job's interrupts are recorded but fail.
    pub fn failing_interrupt(mut self) -> Self {
        self.failing_signals.push(Signal::Interrupt);
        self
    }

    /// The job's hard kills are recorded but fail.
    pub fn failing_kill(mut self) -> Self {
        self.failing_signals.push(Signal::Kill);
        self
    }

    pub fn into_dyn(self) -> Arc<dyn Host> {
        Arc::new(self)
    }
}

impl Host for FakeHost {
    fn host_id(&self) -> &str {
        &self.id
    }

    fn run(&self, _command: &str, _level: JobLevel) -> Result<CommandOutput> {
        Ok(CommandOutput {
            passed: true,
            ..Default::default()
        })
    }

    fn run_background(&self, _task: &Task, _level: JobLevel) -> Result<Box<dyn Job>> {
        if self.fail_launch {
            return Err(PerfError::GenericError(format!(
                "can't reach '{}'",
                self.id
            )));
        }

        Ok(Box::new(FakeJob {
            host_id: self.id.clone(),
            payload: self.payload.clone(),
            fail_wait: self.fail_wait,
            failing_signals: self.failing_signals.clone(),
            signals: self.signals.clone(),
            result: None,
        }))
    }
}

#[derive(Debug)]
struct FakeJob {
    host_id: String,
    payload: Option<Value>,
    fail_wait: bool,
    failing_signals: Vec<Signal>,
    signals: SignalLog,
    result: Option<Value>,
}

impl Job for FakeJob {
    fn host_id(&self) -> &str {
        &self.host_id
    }

    fn kill(&mut self, signal: Signal) -> Result<()> {
        self.signals
            .lock()
            .unwrap()
            .push((self.host_id.clone(), signal));

        if self.failing_signals.contains(&signal) {
            return Err(PerfError::GenericError(format!("{signal:?} was refused")));
        }

        Ok(())
    }

    fn wait(&mut self) -> Result<()> {
        if self.fail_wait {
            return Err(PerfError::GenericError("timed out".to_string()));
        }

        self.result = self.payload.clone();
        Ok(())
    }

    fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

/// A raw sample where every state of each listed CPU reads the given value.
pub fn sample(timestamp: f64, duration: f64, cpus: &[(&str, u64)]) -> Value {
    let mut sample = json!({ "timestamp": timestamp, "duration": duration });
    for (cpu, reading) in cpus {
        sample[*cpu] = json!({
            "user": reading,
            "nice": reading,
            "system": reading,
            "idle": reading,
            "iowait": reading,
            "irq": reading,
            "softirq": reading,
            "steal": reading,
        });
    }

    sample
}

/// The signals each host received, in order.
pub fn signals_for(signals: &SignalLog, host: &str) -> Vec<Signal> {
    signals
        .lock()
        .unwrap()
        .iter()
        .filter(|(id, _)| id == host)
        .map(|(_, signal)| *signal)
        .collect()
}
