//! Construction-time configuration of `BucketEstimator`.
//!
//! The only recognized option is the memory budget, expressed either in bytes or
//! directly as a number of buckets. Larger budgets mean more buckets, slower
//! growth of bucket width and better accuracy.

use std::mem::size_of;

use rand::{Rng, SeedableRng};

use crate::error::EstimatorError;
use crate::estimator::BucketEstimator;

/// Default memory budget of bucket counters (32 KiB)
pub const DEFAULT_MEMORY_BUDGET: usize = 32 * 1024;
/// Storage width of a single bucket counter
const COUNTER_SIZE: usize = size_of::<u32>();

/// Bucket count of a `BucketEstimator`, derived from its memory budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorConfig {
    bucket_count: usize,
}

impl EstimatorConfig {
    /// Derive bucket count from memory budget in bytes
    pub fn with_memory_budget(budget: usize) -> Result<Self, EstimatorError> {
        let bucket_count = budget / COUNTER_SIZE;
        if bucket_count == 0 {
            return Err(EstimatorError::MemoryBudgetTooSmall { budget });
        }
        Ok(Self { bucket_count })
    }

    /// Use given bucket count directly
    pub fn with_bucket_count(bucket_count: usize) -> Result<Self, EstimatorError> {
        if bucket_count == 0 {
            return Err(EstimatorError::InvalidBucketCount);
        }
        Ok(Self { bucket_count })
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Bytes occupied by bucket counters
    #[inline]
    pub fn memory_budget(&self) -> usize {
        self.bucket_count * COUNTER_SIZE
    }

    /// Build estimator with entropy seeded random source
    pub fn build<R: Rng + SeedableRng>(self) -> BucketEstimator<R> {
        self.build_with_rng(R::from_entropy())
    }

    /// Build estimator with deterministically seeded random source
    pub fn build_seeded<R: Rng + SeedableRng>(self, seed: u64) -> BucketEstimator<R> {
        self.build_with_rng(R::seed_from_u64(seed))
    }

    pub fn build_with_rng<R: Rng>(self, rng: R) -> BucketEstimator<R> {
        BucketEstimator::with_rng(self, rng)
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_MEMORY_BUDGET / COUNTER_SIZE,
        }
    }
}
