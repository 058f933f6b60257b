//! `bounded-cardinality` is a Rust crate designed to estimate the number of distinct non-negative
//! integers in a stream within a fixed memory budget, regardless of how many values are observed
//! or how large their range is.
//!
//! The estimator splits the value domain into a fixed number of buckets holding saturating
//! probabilistic counters and widens the buckets as larger values arrive.
mod config;
pub mod counter;
mod error;
pub mod estimator;
pub mod harness;
mod sections;

pub use config::{EstimatorConfig, DEFAULT_MEMORY_BUDGET};
pub use counter::{Counter, DistinctCount, ExactCounter};
pub use error::EstimatorError;
pub use estimator::BucketEstimator;
