use serde::Deserialize;

use crate::host::JobLevel;

/// The config file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub(crate) measurement: MeasurementConfig,
    #[serde(default)]
    pub(crate) turboboost: TurboboostConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StringOrNum {
    String(String),
    Num(u64),
}

/// Measurement settings. Times take a number in milliseconds or a
/// human-readable duration.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct MeasurementConfig {
    pub(crate) interval: Option<StringOrNum>,
    pub(crate) duration: Option<StringOrNum>,
    pub(crate) host_id: Option<String>,
    pub(crate) job_level: Option<JobLevel>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct TurboboostConfig {
    #[serde(default)]
    pub(crate) disable: bool,
}
