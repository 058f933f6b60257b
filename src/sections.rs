//! ## Sections
//! Fixed-size array of saturating bucket counters.
//!
//! Bucket `i` covers the half-open value range `[i * width, (i + 1) * width)` and
//! its counter never exceeds `width`. The number of buckets is fixed at creation;
//! growing capacity only widens buckets.
//!
//! Widening is a rebuild: a new array is allocated, groups of `new_width / width`
//! consecutive counters are summed into it, and the trailing buckets (ranges that
//! were previously out of reach) start at zero.

use std::mem::{size_of, size_of_val};

/// Largest supported bucket width, keeps every counter within `u32`
pub(crate) const MAX_WIDTH: u32 = 1 << 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Sections {
    /// Number of distinct values a single bucket represents (power of two)
    width: u32,
    /// Saturating counters, `counters[i] <= width`
    counters: Vec<u32>,
}

impl Sections {
    /// Create sections of `len` empty buckets with unit width
    #[inline]
    pub(crate) fn new(len: usize) -> Self {
        Self {
            width: 1,
            counters: vec![0; len],
        }
    }

    #[inline]
    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.counters.len()
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[u32] {
        &self.counters
    }

    /// Largest value (exclusive) representable with current width, `None` on `u64` overflow
    #[inline]
    pub(crate) fn capacity(&self) -> Option<u64> {
        (self.len() as u64).checked_mul(u64::from(self.width))
    }

    /// Return whether `value` falls into one of the buckets
    #[inline]
    pub(crate) fn covers(&self, value: u64) -> bool {
        value / u64::from(self.width) < self.len() as u64
    }

    /// Return bucket index of `value`, which must be covered
    #[inline]
    pub(crate) fn index_of(&self, value: u64) -> usize {
        (value / u64::from(self.width)) as usize
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> u32 {
        self.counters[idx]
    }

    /// Increment bucket `idx`, saturating at `width`
    #[inline]
    pub(crate) fn increment(&mut self, idx: usize) {
        let counter = &mut self.counters[idx];
        if *counter < self.width {
            *counter += 1;
        }
    }

    /// Overwrite bucket `idx`, clamped to `width`
    #[inline]
    pub(crate) fn set(&mut self, idx: usize, value: u32) {
        self.counters[idx] = value.min(self.width);
    }

    /// Sum of all bucket counters
    #[inline]
    pub(crate) fn sum(&self) -> u64 {
        self.counters.iter().map(|&c| u64::from(c)).sum()
    }

    /// Build coarser sections of `new_width` merging groups of current buckets.
    ///
    /// `new_width` must be a power of two no smaller than the current width.
    pub(crate) fn rebuild(&self, new_width: u32) -> Sections {
        debug_assert!(new_width.is_power_of_two() && new_width >= self.width);
        let factor = (new_width / self.width) as usize;
        let mut counters = vec![0u32; self.len()];
        // chunks beyond `len / factor` don't exist, so the tail of `counters` stays zero
        for (counter, group) in counters.iter_mut().zip(self.counters.chunks(factor)) {
            *counter = group.iter().sum();
        }
        Sections {
            width: new_width,
            counters,
        }
    }

    /// Return memory size of heap allocated counters
    #[inline]
    pub(crate) fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(self.counters.as_slice())
    }
}
