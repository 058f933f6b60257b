#![no_main]

use bounded_cardinality::{BucketEstimator, EstimatorConfig, EstimatorError};
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use wyhash::{wyhash, WyRng};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let seed = wyhash(data, 0);
    let bucket_count = 1 + usize::from(data[0]) * 16;
    let config = EstimatorConfig::with_bucket_count(bucket_count).unwrap();
    let split_index = seed as usize % data.len();
    let (first_half, second_half) = data[1..].split_at(split_index.min(data.len() - 1));

    let mut estimator1 = BucketEstimator::with_rng(config, WyRng::seed_from_u64(seed));
    observe_chunks(&mut estimator1, first_half);

    let mut estimator2 = BucketEstimator::with_rng(config, WyRng::seed_from_u64(!seed));
    observe_chunks(&mut estimator2, second_half);

    estimator1.merge(&estimator2).unwrap();
    check_invariants(&estimator1, bucket_count);
});

fn observe_chunks(estimator: &mut BucketEstimator, data: &[u8]) {
    for chunk in data.chunks(8) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        let value = u64::from_le_bytes(buf);

        let width = estimator.width();
        let estimate = estimator.estimate();
        match estimator.try_observe(value) {
            Ok(()) => {
                assert!(estimator.estimate() >= estimate);
                assert!(estimator.estimate() <= estimate + 1);
                assert!(estimator.estimate() > 0);
            }
            Err(EstimatorError::CapacityExceeded { max, .. }) => {
                assert!(value > max);
                assert_eq!(estimator.estimate(), estimate);
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
        assert!(estimator.width() >= width);
        check_invariants(estimator, estimator.bucket_count());
    }
}

fn check_invariants(estimator: &BucketEstimator, bucket_count: usize) {
    assert_eq!(estimator.buckets().len(), bucket_count);
    assert!(estimator.width().is_power_of_two());
    assert!(estimator.buckets().iter().all(|&c| c <= estimator.width()));
}
