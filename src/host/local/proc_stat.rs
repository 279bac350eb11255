//! Per-CPU state times from `/proc/stat`.

#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::utils::error::Result;

/// The state columns of a `cpu` line, in kernel order. Older kernels report
/// fewer of them.
pub(crate) const PROC_STAT_STATES: [&str; 10] = [
    "user",
    "nice",
    "system",
    "idle",
    "iowait",
    "irq",
    "softirq",
    "steal",
    "guest",
    "guest_nice",
];

/// Cumulative state times per CPU, keyed by the line's label (`cpu`, `cpu0`, ...).
pub(crate) type CpuTimes = IndexMap<String, Vec<u64>>;

/// Given `/proc/stat` file contents, grab the cumulative state times of every
/// `cpu` line. Unparsable columns end the line early.
pub(crate) fn parse_proc_stat(contents: &str) -> CpuTimes {
    contents
        .lines()
        .filter(|line| line.starts_with("cpu"))
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let label = columns.next()?;
            let times = columns
                .take(PROC_STAT_STATES.len())
                .map_while(|column| column.parse::<u64>().ok())
                .collect::<Vec<_>>();

            Some((label.to_string(), times))
        })
        .collect()
}

pub(crate) fn read_proc_stat(path: &Path) -> Result<CpuTimes> {
    Ok(parse_proc_stat(&fs::read_to_string(path)?))
}

/// Builds one raw sample out of two snapshots: each CPU present in both maps
/// to its per-state deltas.
pub(crate) fn sample_from_delta(
    prev: &CpuTimes, curr: &CpuTimes, timestamp: f64, duration: f64,
) -> Value {
    let mut sample = Map::new();
    sample.insert("timestamp".into(), json!(timestamp));
    sample.insert("duration".into(), json!(duration));

    for (cpu, times) in curr {
        let Some(prev_times) = prev.get(cpu) else {
            continue;
        };

        let states = PROC_STAT_STATES
            .iter()
            .zip(times.iter().zip(prev_times))
            .map(|(state, (now, then))| (state.to_string(), json!(now.saturating_sub(*then))))
            .collect::<Map<_, _>>();

        sample.insert(cpu.clone(), Value::Object(states));
    }

    Value::Object(sample)
}
