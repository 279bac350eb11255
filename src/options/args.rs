// Argument parsing via clap.
//
// Keep this as a single file that only depends on clap and indoc, the build
// script includes it to generate completions and the manpage.

use clap::*;
use indoc::indoc;

const TEMPLATE: &str = indoc! {
    "{name} {version}

    {about}

    {usage-heading} {usage}

    {all-args}"
};

const USAGE: &str = "perfstat [OPTIONS]";

/// The arguments for perfstat.
#[derive(Parser, Debug)]
#[command(
    name = crate_name!(),
    version = crate_version!(),
    about = crate_description!(),
    color = ColorChoice::Auto,
    help_template = TEMPLATE,
    override_usage = USAGE,
)]
pub struct Args {
    #[arg(
        short = 'C',
        long,
        value_name = "PATH",
        help = "Sets the location of the config file.",
        long_help = "Sets the location of the config file. Expects a config file in the TOML format. \
                    If not set, the platform config directory is checked for perfstat/perfstat.toml."
    )]
    pub config_location: Option<String>,

    #[arg(
        short = 'd',
        long,
        value_name = "TIME",
        help = "How long to measure for.",
        long_help = "How long to measure for. Takes a number in milliseconds or a human-readable \
                    duration (e.g. 30s). Must be at least the sampling interval, and defaults to 10s. \
                    Ctrl-C stops the measurement early."
    )]
    pub duration: Option<String>,

    #[arg(
        short = 'i',
        long,
        value_name = "TIME",
        help = "Sets how often CPU states are sampled.",
        long_help = "Sets how often CPU states are sampled. Takes a number in milliseconds or a \
                    human-readable duration (e.g. 500ms). The minimum is 100ms, and defaults to 1s."
    )]
    pub interval: Option<String>,

    #[arg(
        long,
        help = "Disables CPU turboboost while measuring.",
        long_help = "Disables CPU turboboost through the intel_pstate sysfs interface while measuring, \
                    and turns it back on afterwards. Hosts without intel_pstate are left alone."
    )]
    pub disable_turboboost: bool,

    #[arg(
        long,
        value_name = "ID",
        help = "The identifier results are reported under for this host."
    )]
    pub host_id: Option<String>,

    #[arg(long, help = "Prints the full results as JSON.")]
    pub json: bool,

    #[cfg(feature = "logging")]
    #[arg(
        long,
        value_name = "PATH",
        help = "Writes debug logs to the given file."
    )]
    pub log_file: Option<String>,
}
