use std::fmt::{Display, Formatter};

/// Errors reported by `BucketEstimator` and its configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorError {
    /// Bucket count must be at least one
    InvalidBucketCount,
    /// Memory budget can't hold a single bucket counter
    MemoryBudgetTooSmall { budget: usize },
    /// Merged estimators must be built with the same bucket count
    BucketCountMismatch { lhs: usize, rhs: usize },
    /// Observed value is beyond the largest capacity the estimator can grow to
    CapacityExceeded { value: u64, max: u64 },
}

impl Display for EstimatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBucketCount => write!(f, "bucket count must be greater than zero"),
            Self::MemoryBudgetTooSmall { budget } => {
                write!(f, "memory budget of {budget} bytes can't hold a bucket")
            }
            Self::BucketCountMismatch { lhs, rhs } => {
                write!(f, "can't merge estimators with {lhs} and {rhs} buckets")
            }
            Self::CapacityExceeded { value, max } => {
                write!(f, "value {value} exceeds maximum capacity {max}")
            }
        }
    }
}

impl std::error::Error for EstimatorError {}
