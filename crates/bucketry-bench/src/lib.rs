//! Benchmark profiles and utilities for bucketry.
//!
//! - [`reference_config`]: 64-slot buckets, the library default
//! - [`filled_array`]: an array holding `0..count` with no holes
//! - [`fragmented_array`]: a filled array with scattered removals
//! - [`removal_indices`]: deterministic pseudo-random removal positions

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use bucketry::{BucketArray, BucketArrayConfig};

/// Config used by every benchmark unless stated otherwise.
pub fn reference_config() -> BucketArrayConfig {
    BucketArrayConfig::new()
}

/// Build an array holding `0..count` appended one element at a time.
pub fn filled_array(count: usize, config: BucketArrayConfig) -> BucketArray<u64> {
    let mut array = BucketArray::new(config).unwrap();
    for v in 0..count as u64 {
        array.add(v).unwrap();
    }
    array
}

/// Build a filled array, then remove `removals` elements at positions
/// chosen by [`removal_indices`].
pub fn fragmented_array(
    count: usize,
    removals: usize,
    config: BucketArrayConfig,
    seed: u64,
) -> BucketArray<u64> {
    let mut array = filled_array(count, config);
    for index in removal_indices(count, removals, seed) {
        array.remove_at(index);
    }
    array
}

/// Generate `n` removal positions valid for an array shrinking from `len`.
///
/// The `i`-th position is below `len - i`, so applying them in order never
/// goes out of bounds.
pub fn removal_indices(len: usize, n: usize, seed: u64) -> Vec<usize> {
    let n = n.min(len);
    let mut state = seed;
    (0..n)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % (len - i) as u64) as usize
        })
        .collect()
}
