#![warn(rust_2018_idioms)]

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use perfstat::{
    host::{local::LocalHost, Host},
    host_config::{DisableTurboboost, SubConfiguration},
    measurement::{
        stat_cpu::{StatCpuMeasurement, StatCpuMeasurementResults},
        CpuMeasurementResults, Measurement, MeasurementResults,
    },
    options::{self, Args},
    results::PerfResult,
    utils::cancellation_token::CancellationToken,
};

fn main() -> Result<()> {
    let args = Args::parse();

    #[cfg(feature = "logging")]
    if let Some(log_file) = &args.log_file {
        let log_file = std::ffi::OsStr::new(log_file);
        perfstat::utils::logging::init_logger(log::LevelFilter::Debug, log_file)
            .context("Unable to initialize the logger.")?;
    }

    let settings = options::init(&args)?;
    log::debug!("Running with {settings:?}");

    let host: Arc<dyn Host> = Arc::new(LocalHost::new(settings.host_id.clone()));
    let turboboost = DisableTurboboost::new(settings.disable_turboboost, vec![host.clone()]);
    let mut measurement = StatCpuMeasurement::new(vec![host])
        .with_interval(settings.interval)
        .with_job_level(settings.job_level);

    let cancellation_token = Arc::new(CancellationToken::default());
    {
        let cancellation_token = cancellation_token.clone();
        ctrlc::set_handler(move || {
            cancellation_token.cancel();
        })
        .context("Unable to set the Ctrl-C handler.")?;
    }

    turboboost
        .apply()
        .context("Unable to apply the turboboost configuration.")?;
    for line in turboboost.describe()? {
        log::info!("{line}");
    }

    let started = Instant::now();
    let measured = run(&mut measurement, &cancellation_token, settings.duration);

    // Always try to restore the host, even if the measurement went badly.
    let restored = turboboost
        .remove()
        .context("Unable to restore the turboboost configuration.");
    measured?;
    restored?;

    log::info!(
        "Measured for {}",
        humantime::format_duration(started.elapsed())
    );

    let results = measurement
        .collect_results()
        .context("Unable to collect the measurement results.")?;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_summary(&results)?;
    }

    Ok(())
}

fn run(
    measurement: &mut StatCpuMeasurement, cancellation_token: &CancellationToken,
    duration: Duration,
) -> Result<()> {
    measurement
        .start()
        .context("Unable to start the measurement.")?;

    if cancellation_token.sleep_with_cancellation(duration) {
        log::info!("Stopping the measurement early.");
    }

    measurement
        .finish()
        .context("Unable to finish the measurement.")
}

fn print_summary(results: &[StatCpuMeasurementResults]) -> Result<()> {
    for result in results {
        let busy = match result.busy_fraction()? {
            Some(fraction) => format!("{:.1}%", fraction * 100.0),
            None => "n/a".to_string(),
        };
        let utilization = result.utilization()?;
        let (start, end) = (result.start_timestamp()?, result.end_timestamp()?);

        println!(
            "{host} {cpu:<6} busy {busy:>6}  ({:.0} time units over {:.2}s)",
            utilization.value(),
            end - start,
            host = result.host(),
            cpu = result.cpu(),
        );
    }

    Ok(())
}
