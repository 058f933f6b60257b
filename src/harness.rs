//! Validation harness feeding uniformly random values into a counter and
//! checking its estimate against the exact distinct count.

use std::fmt::{Display, Formatter};

use rand::Rng;
use tracing::info;

use crate::counter::{DistinctCount, ExactCounter};

/// Relative error accepted by the reference harness
pub const DEFAULT_TOLERANCE: f64 = 0.1;
/// Number of observations per trial
pub const DEFAULT_SAMPLES: usize = 1_000_000;

/// Value ranges `[1 .. k]` exercised for `samples` observations: from a single
/// repeated value up to a domain ten times larger than the sample count.
/// Every range is at least 1.
pub fn default_ranges(samples: usize) -> [u64; 7] {
    let n = samples as u64;
    [1, 10, 1000, 10_000, n / 10, n, n.saturating_mul(10)].map(|k| k.max(1))
}

/// Return `|got - expected| / expected`, zero when both are zero
pub fn relative_error(expected: u64, got: u64) -> f64 {
    if expected == 0 {
        return if got == 0 { 0.0 } else { f64::INFINITY };
    }
    expected.abs_diff(got) as f64 / expected as f64
}

/// Outcome of a single harness run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    /// Upper bound of value range `[1 .. range]`
    pub range: u64,
    /// Number of observed values
    pub samples: usize,
    /// Exact number of distinct values
    pub exact: u64,
    /// Counter estimate
    pub estimate: u64,
    pub relative_error: f64,
}

impl Trial {
    /// Return whether relative error is within `tolerance`
    pub fn passed(&self, tolerance: f64) -> bool {
        self.relative_error <= tolerance
    }
}

impl Display for Trial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} numbers in range [1 .. {}], {} uniq, {} result, {:.5} relative error",
            self.samples, self.range, self.exact, self.estimate, self.relative_error
        )
    }
}

/// Observe `samples` values drawn uniformly from `[1, range]` with both `counter`
/// and an exact reference counter. A zero `range` is treated as 1.
pub fn run_trial<C, R>(counter: &mut C, range: u64, samples: usize, rng: &mut R) -> Trial
where
    C: DistinctCount + ?Sized,
    R: Rng,
{
    let range = range.max(1);
    let mut exact = ExactCounter::new();
    for _ in 0..samples {
        let value = rng.gen_range(1..=range);
        exact.observe(value);
        counter.observe(value);
    }

    let trial = Trial {
        range,
        samples,
        exact: exact.estimate(),
        estimate: counter.estimate(),
        relative_error: relative_error(exact.estimate(), counter.estimate()),
    };
    info!(
        target: "bounded_cardinality::harness",
        counter = counter.name(),
        range,
        exact = trial.exact,
        estimate = trial.estimate,
        relative_error = trial.relative_error,
        "trial_finished"
    );
    trial
}
