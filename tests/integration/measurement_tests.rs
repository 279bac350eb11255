//! Runs the CPU-stat measurement end to end against fake hosts.

use std::sync::{Arc, Mutex};

use perfstat::{
    host::Signal,
    measurement::{
        stat_cpu::StatCpuMeasurement, CpuMeasurementResults, Measurement, MeasurementResults,
        MeasurementState,
    },
    results::PerfResult,
    utils::error::JobAction,
    PerfError,
};

use crate::util::{sample, signals_for, FakeHost, SignalLog};

fn signal_log() -> SignalLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn test_results_per_host_and_cpu() {
    let signals = signal_log();
    let beta = FakeHost::new("beta", &signals).with_samples(vec![
        sample(10.0, 1.0, &[("cpu", 10), ("cpu0", 5)]),
        sample(11.0, 1.0, &[("cpu", 20), ("cpu0", 10)]),
    ]);
    let alpha =
        FakeHost::new("alpha", &signals).with_samples(vec![sample(10.0, 1.0, &[("cpu", 1)])]);

    let mut measurement = StatCpuMeasurement::new(vec![beta.into_dyn(), alpha.into_dyn()]);
    measurement.start().unwrap();
    measurement.finish().unwrap();

    let results = measurement.collect_results().unwrap();
    let keys = results
        .iter()
        .map(|r| (r.host().to_string(), r.cpu().to_string()))
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            ("alpha".to_string(), "cpu".to_string()),
            ("beta".to_string(), "cpu".to_string()),
            ("beta".to_string(), "cpu0".to_string()),
        ]
    );

    // Samples from one host never leak into another's results.
    assert_eq!(results[0].channel("user").unwrap().len(), 1);
    assert_eq!(results[1].channel("user").unwrap().len(), 2);

    let beta_cpu = &results[1];
    assert_eq!(beta_cpu.start_timestamp(), Ok(10.0));
    assert_eq!(beta_cpu.end_timestamp(), Ok(12.0));

    let utilization = beta_cpu.utilization().unwrap();
    assert_eq!(utilization.value(), 6.0 * (10.0 + 20.0));
    assert_eq!(beta_cpu.busy_fraction(), Ok(Some(0.75)));

    for host in ["alpha", "beta"] {
        assert_eq!(
            signals_for(&signals, host),
            vec![Signal::Interrupt, Signal::Kill]
        );
    }
}

#[test]
fn test_every_job_killed_when_wait_fails() {
    let signals = signal_log();
    let ok = FakeHost::new("ok", &signals).with_samples(vec![sample(0.0, 1.0, &[("cpu", 3)])]);
    let stuck = FakeHost::new("stuck", &signals)
        .with_samples(vec![sample(0.0, 1.0, &[("cpu", 3)])])
        .failing_wait();

    let mut measurement = StatCpuMeasurement::new(vec![stuck.into_dyn(), ok.into_dyn()]);
    measurement.start().unwrap();

    match measurement.finish() {
        Err(PerfError::JobControl(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].host, "stuck");
            assert_eq!(failures[0].action, JobAction::Wait);
        }
        other => panic!("expected a job control error, got {other:?}"),
    }

    assert_eq!(measurement.state(), MeasurementState::Finished);
    for host in ["ok", "stuck"] {
        assert_eq!(
            signals_for(&signals, host),
            vec![Signal::Interrupt, Signal::Kill]
        );
    }

    // The stuck job never handed over its samples.
    let results = measurement.collect_results().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].host(), "ok");

    // Nothing is left running, so finishing again is a state error.
    assert!(matches!(
        measurement.finish(),
        Err(PerfError::InvalidState(_))
    ));
}

#[test]
fn test_failed_interrupt_skips_wait() {
    let signals = signal_log();
    let deaf = FakeHost::new("deaf", &signals)
        .with_samples(vec![sample(0.0, 1.0, &[("cpu", 3)])])
        .failing_interrupt();
    let ok = FakeHost::new("ok", &signals).with_samples(vec![sample(0.0, 1.0, &[("cpu", 3)])]);

    let mut measurement = StatCpuMeasurement::new(vec![ok.into_dyn(), deaf.into_dyn()]);
    measurement.start().unwrap();

    match measurement.finish() {
        Err(PerfError::JobControl(failures)) => {
            let failures = failures
                .iter()
                .map(|failure| (failure.host.as_str(), failure.action))
                .collect::<Vec<_>>();
            assert_eq!(failures, vec![("deaf", JobAction::Interrupt)]);
        }
        other => panic!("expected a job control error, got {other:?}"),
    }

    for host in ["deaf", "ok"] {
        assert_eq!(
            signals_for(&signals, host),
            vec![Signal::Interrupt, Signal::Kill]
        );
    }

    // Only waited-on jobs hand over their samples.
    let results = measurement.collect_results().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].host(), "ok");
}

#[test]
fn test_failed_kill_is_reported() {
    let signals = signal_log();
    let stubborn = FakeHost::new("stubborn", &signals)
        .with_samples(vec![sample(0.0, 1.0, &[("cpu", 3)])])
        .failing_kill();
    let ok = FakeHost::new("ok", &signals).with_samples(vec![sample(0.0, 1.0, &[("cpu", 3)])]);

    let mut measurement = StatCpuMeasurement::new(vec![stubborn.into_dyn(), ok.into_dyn()]);
    measurement.start().unwrap();

    match measurement.finish() {
        Err(PerfError::JobControl(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].host, "stubborn");
            assert_eq!(failures[0].action, JobAction::Kill);
        }
        other => panic!("expected a job control error, got {other:?}"),
    }

    assert_eq!(measurement.state(), MeasurementState::Finished);
    assert_eq!(
        signals_for(&signals, "ok"),
        vec![Signal::Interrupt, Signal::Kill]
    );

    // The samples were captured by the wait, before the kill failed.
    let results = measurement.collect_results().unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn test_every_failure_is_collected() {
    let signals = signal_log();
    let broken = FakeHost::new("a", &signals)
        .failing_interrupt()
        .failing_kill();
    let fine = FakeHost::new("b", &signals);

    let mut measurement = StatCpuMeasurement::new(vec![fine.into_dyn(), broken.into_dyn()]);
    measurement.start().unwrap();

    let err = measurement.finish().unwrap_err();
    match &err {
        PerfError::JobControl(failures) => {
            let failures = failures
                .iter()
                .map(|failure| (failure.host.as_str(), failure.action))
                .collect::<Vec<_>>();
            assert_eq!(
                failures,
                vec![("a", JobAction::Interrupt), ("a", JobAction::Kill)]
            );
        }
        other => panic!("expected a job control error, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Job control error, 2 failure(s)"));

    assert_eq!(
        *signals.lock().unwrap(),
        vec![
            ("a".to_string(), Signal::Interrupt),
            ("b".to_string(), Signal::Interrupt),
            ("a".to_string(), Signal::Kill),
            ("b".to_string(), Signal::Kill),
        ]
    );
}

#[test]
fn test_failed_launch_kills_started_jobs() {
    let signals = signal_log();
    let hosts = vec![
        FakeHost::new("c", &signals).into_dyn(),
        FakeHost::new("b", &signals).failing_launch().into_dyn(),
        FakeHost::new("a", &signals).into_dyn(),
    ];

    let mut measurement = StatCpuMeasurement::new(hosts);
    assert!(matches!(
        measurement.start(),
        Err(PerfError::GenericError(_))
    ));

    assert_eq!(measurement.state(), MeasurementState::Idle);
    assert_eq!(signals_for(&signals, "a"), vec![Signal::Kill]);
    assert!(signals_for(&signals, "c").is_empty());
}

#[test]
fn test_collect_before_finish() {
    let signals = signal_log();
    let mut measurement = StatCpuMeasurement::new(vec![FakeHost::new("a", &signals).into_dyn()]);

    assert!(matches!(
        measurement.collect_results(),
        Err(PerfError::InvalidState(_))
    ));

    measurement.start().unwrap();
    assert!(matches!(
        measurement.collect_results(),
        Err(PerfError::InvalidState(_))
    ));

    measurement.finish().unwrap();
    assert_eq!(measurement.collect_results(), Ok(vec![]));

    measurement.reset().unwrap();
    assert_eq!(measurement.state(), MeasurementState::Idle);
    measurement.start().unwrap();
    measurement.finish().unwrap();
}

#[test]
fn test_slices_of_results() {
    let signals = signal_log();
    let host = FakeHost::new("a", &signals).with_samples(
        (0..4)
            .map(|i| sample(f64::from(i), 1.0, &[("cpu", 10)]))
            .collect(),
    );

    let mut measurement = StatCpuMeasurement::new(vec![host.into_dyn()]);
    measurement.start().unwrap();
    measurement.finish().unwrap();

    let results = measurement.collect_results().unwrap();
    let cpu = &results[0];

    let whole = cpu.time_slice(0.0, 4.0);
    assert_eq!(&whole, cpu);

    let first = cpu.time_slice(0.0, 1.5);
    let second = cpu.time_slice(1.5, 4.0);
    let total = cpu.utilization().unwrap().value();
    let split =
        first.utilization().unwrap().value() + second.utilization().unwrap().value();
    assert!((total - split).abs() < 1e-9);

    // Half of the second interval falls into each slice.
    assert_eq!(first.channel("user").unwrap().len(), 2);
    assert_eq!(second.channel("user").unwrap().len(), 3);
    assert_eq!(first.end_timestamp(), Ok(1.5));

    let outside = cpu.time_slice(10.0, 20.0);
    assert!(outside.channel("user").unwrap().is_empty());
    assert!(outside.start_timestamp().is_err());
}

#[test]
fn test_zero_length_samples_are_skipped() {
    let signals = signal_log();
    let host = FakeHost::new("a", &signals).with_samples(vec![
        sample(0.0, 1.0, &[("cpu", 1)]),
        sample(1.0, 0.0, &[("cpu", 5)]),
        sample(1.0, 1.0, &[("cpu", 2)]),
        sample(2.0, 0.0, &[("cpu", 5), ("cpu0", 5)]),
    ]);

    let mut measurement = StatCpuMeasurement::new(vec![host.into_dyn()]);
    measurement.start().unwrap();
    measurement.finish().unwrap();

    // cpu0 only ever showed up in a zero-length sample.
    let results = measurement.collect_results().unwrap();
    assert_eq!(results.len(), 1);

    let cpu = &results[0];
    let user = cpu.channel("user").unwrap();
    assert_eq!(user.len(), 2);
    assert_eq!(user.value(), 3.0);

    let (start, end) = (cpu.start_timestamp().unwrap(), cpu.end_timestamp().unwrap());
    assert_eq!((start, end), (0.0, 2.0));
    assert_eq!(&cpu.time_slice(start, end), cpu);
}
