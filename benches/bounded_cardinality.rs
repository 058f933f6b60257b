#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::hash::BuildHasherDefault;

use bounded_cardinality::harness::{default_ranges, relative_error};
use bounded_cardinality::{BucketEstimator, DistinctCount, ExactCounter};
use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use hyperloglogplus::HyperLogLog;
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use wyhash::{WyHash, WyRng};

/// Observations per run, overridden by environment variable `N`.
///
/// Bucket width and therefore accuracy depend on the value range rather than on the
/// number of observations, so every table sweeps `default_ranges(N)`: from a single
/// repeated value up to a domain ten times larger than `N`.
const DEFAULT_SAMPLES: usize = 100_000;
/// Independent runs averaged per range in the error table
const ERROR_RUNS: u64 = 10;

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf));
    targets = benchmark
}
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let bench_results_path =
        std::env::var("BENCH_RESULTS_PATH").unwrap_or_else(|_| "target".to_string());
    let samples = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SAMPLES);
    let ranges = default_ranges(samples);

    let mut group = c.benchmark_group("observe");
    group.throughput(Throughput::Elements(samples as u64));
    for &range in &ranges {
        let values = draw_values(range, samples, range);
        bench_observe::<Bucketed>(&mut group, range, &values);
        bench_observe::<Exact>(&mut group, range, &values);
        bench_observe::<HyperLogLogPlus>(&mut group, range, &values);
    }
    group.finish();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(1));
    for &range in &ranges {
        let values = draw_values(range, samples, range);
        bench_estimate::<Bucketed>(&mut group, range, &values);
        bench_estimate::<Exact>(&mut group, range, &values);
        bench_estimate::<HyperLogLogPlus>(&mut group, range, &values);
    }
    group.finish();

    let results: Vec<RangeRecord> = ranges
        .iter()
        .map(|&range| {
            let values = draw_values(range, samples, range);
            RangeRecord {
                range,
                width: bucket_width(&values),
                bounded_cardinality: measure_allocations::<Bucketed>(&values),
                exact: measure_allocations::<Exact>(&values),
                hyperloglogplus: measure_allocations::<HyperLogLogPlus>(&values),
            }
        })
        .collect();
    write_table(&bench_results_path, "memory_usage.md", results);

    let results: Vec<RangeRecord> = ranges
        .iter()
        .map(|&range| RangeRecord {
            range,
            width: bucket_width(&draw_values(range, samples, range)),
            bounded_cardinality: measure_error::<Bucketed>(range, samples),
            exact: measure_error::<Exact>(range, samples),
            hyperloglogplus: measure_error::<HyperLogLogPlus>(range, samples),
        })
        .collect();
    write_table(&bench_results_path, "relative_error.md", results);
}

/// Values drawn uniformly from `[1, range]`
fn draw_values(range: u64, samples: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..samples).map(|_| rng.gen_range(1..=range)).collect()
}

/// Final bucket width of the default estimator after observing `values`
fn bucket_width(values: &[u64]) -> u32 {
    let mut estimator = Bucketed::new();
    values.iter().for_each(|&v| estimator.observe(v));
    estimator.0.width()
}

fn write_table(path: &str, name: &str, records: Vec<RangeRecord>) {
    let table_config = Settings::default().with(Style::markdown());
    std::fs::write(
        format!("{}/{}", path, name),
        Table::new(records).with(table_config).to_string(),
    )
    .unwrap();
}

/// Distinct counter operations shared by benchmarked implementations.
trait Benchmarked {
    fn new() -> Self;
    fn observe(&mut self, value: u64);
    fn estimate(&mut self) -> u64;
    fn name() -> &'static str;
}

fn bench_observe<E: Benchmarked>(group: &mut BenchmarkGroup<WallTime>, range: u64, values: &[u64]) {
    group.bench_function(BenchmarkId::new(E::name(), range), |b| {
        b.iter(|| {
            let mut estimator = E::new();
            for &v in values {
                estimator.observe(black_box(v));
            }
            estimator.estimate()
        });
    });
}

fn bench_estimate<E: Benchmarked>(
    group: &mut BenchmarkGroup<WallTime>,
    range: u64,
    values: &[u64],
) {
    let mut estimator = E::new();
    values.iter().for_each(|&v| estimator.observe(v));
    group.bench_function(BenchmarkId::new(E::name(), range), |b| {
        b.iter(|| estimator.estimate())
    });
}

/// Heap bytes resident after observing `values` / peak heap bytes
fn measure_allocations<E: Benchmarked>(values: &[u64]) -> String {
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut estimator = E::new();
    values.iter().for_each(|&v| estimator.observe(v));
    let stats = dhat::HeapStats::get();
    format!("{} / {}", stats.curr_bytes, stats.max_bytes)
}

/// Average relative error against the exact distinct count over `ERROR_RUNS` streams
fn measure_error<E: Benchmarked>(range: u64, samples: usize) -> String {
    let total: f64 = (0..ERROR_RUNS)
        .map(|seed| {
            let values = draw_values(range, samples, seed);
            let mut exact = ExactCounter::new();
            let mut estimator = E::new();
            for &v in &values {
                exact.observe(v);
                estimator.observe(v);
            }
            relative_error(exact.estimate(), estimator.estimate())
        })
        .sum();
    format!("{:.4}", total / ERROR_RUNS as f64)
}

#[derive(Tabled)]
struct RangeRecord {
    range: u64,
    width: u32,
    bounded_cardinality: String,
    exact: String,
    hyperloglogplus: String,
}

struct Bucketed(BucketEstimator<WyRng>);

impl Benchmarked for Bucketed {
    fn new() -> Self {
        Self(BucketEstimator::new())
    }

    fn observe(&mut self, value: u64) {
        self.0.observe(value);
    }

    fn estimate(&mut self) -> u64 {
        self.0.estimate()
    }

    fn name() -> &'static str {
        "bounded-cardinality"
    }
}

struct Exact(ExactCounter);

impl Benchmarked for Exact {
    fn new() -> Self {
        Self(ExactCounter::new())
    }

    fn observe(&mut self, value: u64) {
        DistinctCount::observe(&mut self.0, value);
    }

    fn estimate(&mut self) -> u64 {
        DistinctCount::estimate(&self.0)
    }

    fn name() -> &'static str {
        "exact"
    }
}

struct HyperLogLogPlus(hyperloglogplus::HyperLogLogPlus<u64, BuildHasherDefault<WyHash>>);

impl Benchmarked for HyperLogLogPlus {
    fn new() -> Self {
        Self(
            hyperloglogplus::HyperLogLogPlus::new(12, BuildHasherDefault::<WyHash>::default())
                .unwrap(),
        )
    }

    fn observe(&mut self, value: u64) {
        self.0.insert(&value);
    }

    fn estimate(&mut self) -> u64 {
        self.0.count().round() as u64
    }

    fn name() -> &'static str {
        "hyperloglogplus"
    }
}
