//! Bucket estimator allows to estimate number of distinct non-negative integers
//! in a stream using a fixed number of buckets `C` derived from a memory budget.
//!
//! # Data-structure design rationale
//!
//! ## Bounded memory
//! The value domain `[0, C * W)` is split into `C` buckets of width `W` each.
//! `C` never changes, so memory stays at `C` counters regardless of how many
//! values are observed or how large they are. Values beyond the current capacity
//! widen the buckets instead of adding new ones.
//!
//! ## Randomized update rule
//! Bucket `i` holds counter `c <= W` estimating how many distinct values landed in
//! `[i * W, (i + 1) * W)`. On every observation a number `r` is drawn uniformly
//! from `[1, W]` and the counter is incremented only if `r > c`, i.e. with
//! probability `(W - c) / W`. This is exactly the probability that a uniformly
//! drawn value of the bucket has not been seen yet, so the counter tracks the
//! expected number of distinct values without storing any of them.
//!
//! For `W = 1` the rule is exact: a bucket is incremented on its first value only.
//!
//! ## Resizing
//! When value `x` doesn't fit (`x >= C * W`) the new width is the power of two
//! `W' = 2^(ceil(log2(x)) - ceil(log2(C)) + 1)`, which leaves one extra doubling
//! of headroom above `x`. Groups of `W' / W` consecutive buckets are summed into
//! a freshly allocated array, which then replaces the old one.
//!
//! Width is capped at `2^31` to keep counters within `u32`, so the largest value
//! accepted is `C * 2^31 - 1`.

use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::mem::size_of;

use rand::{Rng, SeedableRng};
use tracing::{debug, warn};
use wyhash::WyRng;

use crate::config::EstimatorConfig;
use crate::error::EstimatorError;
use crate::sections::{Sections, MAX_WIDTH};

/// Target of emitted tracing events
const TRACING_TARGET: &str = "bounded_cardinality";

pub struct BucketEstimator<R: Rng = WyRng> {
    /// Bucket counters and their current width
    sections: Sections,
    /// Random source used by the update rule
    rng: R,
}

impl<R: Rng + SeedableRng> BucketEstimator<R> {
    /// Creates new instance of `BucketEstimator` with default memory budget
    #[inline]
    pub fn new() -> Self {
        EstimatorConfig::default().build()
    }
}

impl<R: Rng> BucketEstimator<R> {
    /// Creates new instance of `BucketEstimator` using given random source
    pub fn with_rng(config: EstimatorConfig, rng: R) -> Self {
        debug!(
            target: TRACING_TARGET,
            buckets = config.bucket_count(),
            memory_budget = config.memory_budget(),
            "estimator_created"
        );
        Self {
            sections: Sections::new(config.bucket_count()),
            rng,
        }
    }

    /// Observe value, growing bucket width if it's beyond current capacity.
    ///
    /// # Panics
    ///
    /// Panics if `value` exceeds the largest capacity the estimator can grow to,
    /// see [`BucketEstimator::try_observe`] for the non-panicking variant.
    #[inline]
    pub fn observe(&mut self, value: u64) {
        if let Err(e) = self.try_observe(value) {
            panic!("{e}");
        }
    }

    /// Observe value, returning `CapacityExceeded` instead of wrapping for values
    /// the estimator can't represent. Estimator is left unchanged on error.
    #[inline]
    pub fn try_observe(&mut self, value: u64) -> Result<(), EstimatorError> {
        if !self.sections.covers(value) {
            self.resize(value)?;
        }

        let idx = self.sections.index_of(value);
        let count = self.sections.get(idx);
        let r = self.rng.gen_range(1..=self.sections.width());
        if r > count {
            self.sections.increment(idx);
        }
        Ok(())
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> u64 {
        self.sections.sum()
    }

    /// Merge estimator built over another shard of the stream into `self`.
    ///
    /// Both estimators are aligned to the wider bucket width. Buckets are then
    /// combined by inclusion-exclusion: `a + b - a * b / W`.
    pub fn merge<Q: Rng>(&mut self, rhs: &BucketEstimator<Q>) -> Result<(), EstimatorError> {
        let (lhs_len, rhs_len) = (self.sections.len(), rhs.sections.len());
        if lhs_len != rhs_len {
            return Err(EstimatorError::BucketCountMismatch {
                lhs: lhs_len,
                rhs: rhs_len,
            });
        }

        let width = self.sections.width().max(rhs.sections.width());
        if self.sections.width() < width {
            self.sections = self.sections.rebuild(width);
        }
        let rhs_sections = if rhs.sections.width() < width {
            Cow::Owned(rhs.sections.rebuild(width))
        } else {
            Cow::Borrowed(&rhs.sections)
        };

        let w = u64::from(width);
        for idx in 0..lhs_len {
            let a = u64::from(self.sections.get(idx));
            let b = u64::from(rhs_sections.get(idx));
            let overlap = (a * b + w / 2) / w;
            // a + b - overlap <= w, so the cast never truncates
            self.sections.set(idx, (a + b - overlap) as u32);
        }

        debug!(
            target: TRACING_TARGET,
            width,
            estimate = self.estimate(),
            "estimator_merged"
        );
        Ok(())
    }

    /// Number of distinct values a single bucket currently represents
    #[inline]
    pub fn width(&self) -> u32 {
        self.sections.width()
    }

    /// Number of buckets, fixed for the estimator's lifetime
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.sections.len()
    }

    /// Largest value (exclusive) observable without resizing
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.sections.capacity().unwrap_or(u64::MAX)
    }

    /// Current bucket counters
    #[inline]
    pub fn buckets(&self) -> &[u32] {
        self.sections.as_slice()
    }

    /// Return memory size of `BucketEstimator`
    pub fn size_of(&self) -> usize {
        size_of::<R>() + self.sections.size_of()
    }

    /// Largest value accepted by `try_observe`
    #[inline]
    fn max_value(&self) -> u64 {
        (self.sections.len() as u64)
            .saturating_mul(u64::from(MAX_WIDTH))
            .saturating_sub(1)
    }

    /// Widen buckets so that `value` is covered
    fn resize(&mut self, value: u64) -> Result<(), EstimatorError> {
        let old_width = self.sections.width();
        let new_width = resize_width(value, self.sections.len());
        if new_width <= old_width || !covers(value, self.sections.len(), new_width) {
            let max = self.max_value();
            warn!(target: TRACING_TARGET, value, max, "capacity_exceeded");
            return Err(EstimatorError::CapacityExceeded { value, max });
        }

        self.sections = self.sections.rebuild(new_width);
        debug!(
            target: TRACING_TARGET,
            value,
            old_width,
            new_width,
            factor = new_width / old_width,
            "estimator_resized"
        );
        Ok(())
    }
}

/// Return `ceil(log2(v))`, treating 0 as 1
#[inline]
fn ceil_log2(v: u64) -> u32 {
    v.checked_next_power_of_two()
        .map_or(u64::BITS, |p| p.trailing_zeros())
}

/// Bucket width covering `value` with one doubling of headroom, capped at `MAX_WIDTH`
#[inline]
fn resize_width(value: u64, bucket_count: usize) -> u32 {
    let exp = (ceil_log2(value) + 1).saturating_sub(ceil_log2(bucket_count as u64));
    if exp >= MAX_WIDTH.trailing_zeros() {
        MAX_WIDTH
    } else {
        1 << exp
    }
}

#[inline]
fn covers(value: u64, bucket_count: usize, width: u32) -> bool {
    value / u64::from(width) < bucket_count as u64
}

impl<R: Rng + SeedableRng> Default for BucketEstimator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng + Clone> Clone for BucketEstimator<R> {
    fn clone(&self) -> Self {
        Self {
            sections: self.sections.clone(),
            rng: self.rng.clone(),
        }
    }
}

impl<R: Rng> PartialEq for BucketEstimator<R> {
    /// Compare bucket estimators by state, ignoring random source
    fn eq(&self, rhs: &Self) -> bool {
        self.sections == rhs.sections
    }
}

impl<R: Rng> Debug for BucketEstimator<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ estimate: {}, width: {}, buckets: {}, size: {} }}",
            self.estimate(),
            self.width(),
            self.bucket_count(),
            self.size_of()
        )
    }
}
