//! Common interface of distinct counters fed by the validation harness.
//!
//! `Counter` dispatches statically between the bounded `BucketEstimator` and the
//! `ExactCounter` used as ground truth.

use std::mem::{size_of, size_of_val};

use enum_dispatch::enum_dispatch;
use hashbrown::HashSet;

use crate::estimator::BucketEstimator;

/// Distinct counter trait which must be implemented by all counters.
#[enum_dispatch(Counter)]
pub trait DistinctCount {
    fn observe(&mut self, value: u64);
    fn estimate(&self) -> u64;
    fn size_of(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// Distinct counters supported by the harness
#[enum_dispatch]
#[derive(Debug)]
pub enum Counter {
    Bucketed(BucketEstimator),
    Exact(ExactCounter),
}

impl DistinctCount for BucketEstimator {
    #[inline]
    fn observe(&mut self, value: u64) {
        BucketEstimator::observe(self, value);
    }

    #[inline]
    fn estimate(&self) -> u64 {
        BucketEstimator::estimate(self)
    }

    fn size_of(&self) -> usize {
        BucketEstimator::size_of(self)
    }

    fn name(&self) -> &'static str {
        "bucket-estimator"
    }
}

/// Bytes of trailing control group `hashbrown` allocates past the table (SSE2 group width)
const CONTROL_GROUP_WIDTH: usize = 16;

/// Exact distinct counter, memory grows with number of distinct values
#[derive(Debug, Default, Clone)]
pub struct ExactCounter {
    values: HashSet<u64>,
}

impl ExactCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DistinctCount for ExactCounter {
    #[inline]
    fn observe(&mut self, value: u64) {
        self.values.insert(value);
    }

    #[inline]
    fn estimate(&self) -> u64 {
        self.values.len() as u64
    }

    /// Approximate memory size: one `u64` slot and one control byte per element of
    /// capacity plus the trailing control group. Unused buckets above capacity
    /// (load factor) are not counted.
    fn size_of(&self) -> usize {
        let capacity = self.values.capacity();
        if capacity == 0 {
            return size_of_val(self);
        }
        size_of_val(self) + capacity * (size_of::<u64>() + 1) + CONTROL_GROUP_WIDTH
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}
