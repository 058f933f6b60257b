use std::process::ExitCode;

use bounded_cardinality::harness::{
    default_ranges, run_trial, DEFAULT_SAMPLES, DEFAULT_TOLERANCE,
};
use bounded_cardinality::BucketEstimator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[derive(Tabled)]
struct Record {
    range: u64,
    exact: u64,
    estimate: u64,
    relative_error: String,
    width: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let samples = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SAMPLES);

    let mut rng = StdRng::from_entropy();
    let mut records = Vec::new();
    let mut failed = false;
    for range in default_ranges(samples) {
        let mut estimator: BucketEstimator = BucketEstimator::new();
        let trial = run_trial(&mut estimator, range, samples, &mut rng);
        println!("{trial}");
        failed |= !trial.passed(DEFAULT_TOLERANCE);
        records.push(Record {
            range,
            exact: trial.exact,
            estimate: trial.estimate,
            relative_error: format!("{:.5}", trial.relative_error),
            width: estimator.width(),
        });
    }

    let table_config = Settings::default().with(Style::markdown());
    println!("{}", Table::new(records).with(table_config));

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
