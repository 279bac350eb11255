//! How to build the measurement settings from the arguments and the config
//! file. Arguments take priority over the config file, which takes priority
//! over the defaults.

pub mod args;
pub mod config;
mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub use args::Args;
pub use config::Config;
pub use error::{OptionError, OptionResult};

use self::config::StringOrNum;
use crate::{
    constants::{
        DEFAULT_CONFIG_FILE_LOCATION, DEFAULT_MEASUREMENT_DURATION, DEFAULT_SAMPLE_INTERVAL,
        MIN_SAMPLE_INTERVAL,
    },
    host::JobLevel,
};

/// Everything needed to run a measurement from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSettings {
    pub interval: Duration,
    pub duration: Duration,
    pub host_id: String,
    pub job_level: JobLevel,
    pub disable_turboboost: bool,
    pub json: bool,
}

/// Returns the config path to use. An explicitly given path always wins;
/// otherwise the default location is used if a file exists there.
pub fn get_config_path(override_config_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(conf_loc) = override_config_path {
        return Some(conf_loc.to_path_buf());
    }

    dirs::config_dir()
        .map(|path| path.join(DEFAULT_CONFIG_FILE_LOCATION))
        .filter(|path| path.exists())
}

/// Reads and parses the config file at `path`.
pub fn read_config(path: &Path) -> OptionResult<Config> {
    if !path.exists() {
        return Err(OptionError::config(format!(
            "the config file '{}' does not exist.",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path)?;
    Ok(toml_edit::de::from_str(&contents)?)
}

/// Parses a time given either as a number of milliseconds or as a
/// human-readable duration.
fn try_parse_time(value: &str) -> Result<Duration, ()> {
    if let Ok(ms) = value.parse::<u64>() {
        Ok(Duration::from_millis(ms))
    } else {
        humantime::parse_duration(value).map_err(|_| ())
    }
}

fn get_time(
    arg: Option<&str>, config: Option<&StringOrNum>, name: &str, default: Duration,
) -> OptionResult<Duration> {
    if let Some(value) = arg {
        try_parse_time(value).map_err(|_| {
            OptionError::arg(format!(
                "'--{name}' was set with an invalid value, please update your arguments."
            ))
        })
    } else if let Some(value) = config {
        match value {
            StringOrNum::Num(ms) => Ok(Duration::from_millis(*ms)),
            StringOrNum::String(value) => try_parse_time(value).map_err(|_| {
                OptionError::config(format!(
                    "'{name}' was set with an invalid value, please update it in your config file."
                ))
            }),
        }
    } else {
        Ok(default)
    }
}

/// Builds the [`MeasurementSettings`] out of the arguments and the config.
pub fn get_settings(args: &Args, config: &Config) -> OptionResult<MeasurementSettings> {
    let measurement = &config.measurement;

    let interval = get_time(
        args.interval.as_deref(),
        measurement.interval.as_ref(),
        "interval",
        DEFAULT_SAMPLE_INTERVAL,
    )?;
    if interval < MIN_SAMPLE_INTERVAL {
        return Err(OptionError::arg(format!(
            "'--interval' must be greater than {}ms.",
            MIN_SAMPLE_INTERVAL.as_millis() - 1
        )));
    }

    let duration = get_time(
        args.duration.as_deref(),
        measurement.duration.as_ref(),
        "duration",
        DEFAULT_MEASUREMENT_DURATION,
    )?;
    if duration < interval {
        return Err(OptionError::arg(
            "'--duration' must be at least as long as '--interval'.",
        ));
    }

    let host_id = args
        .host_id
        .clone()
        .or_else(|| measurement.host_id.clone())
        .unwrap_or_else(|| "localhost".to_string());

    Ok(MeasurementSettings {
        interval,
        duration,
        host_id,
        job_level: measurement.job_level.unwrap_or_default(),
        disable_turboboost: args.disable_turboboost || config.turboboost.disable,
        json: args.json,
    })
}

/// Reads the config (if any) and builds the settings.
pub fn init(args: &Args) -> OptionResult<MeasurementSettings> {
    let config = match get_config_path(args.config_location.as_deref().map(Path::new)) {
        Some(path) => read_config(&path)?,
        None => Config::default(),
    };

    get_settings(args, &config)
}
