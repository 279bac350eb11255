use std::time::Duration;

/// How often the CPU-stat monitors sample.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// The shortest sampling interval accepted from the command line or config.
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// How long the binary measures for if nothing else is given.
pub const DEFAULT_MEASUREMENT_DURATION: Duration = Duration::from_secs(10);

/// The config file name, under the platform config directory.
pub const DEFAULT_CONFIG_FILE_LOCATION: &str = "perfstat/perfstat.toml";

/// Where the intel_pstate driver exposes the turbo switch.
pub const INTEL_PSTATE_NO_TURBO: &str = "/sys/devices/system/cpu/intel_pstate/no_turbo";
