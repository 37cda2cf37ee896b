//! Bucket-array configuration parameters.

use crate::error::BucketArrayError;

/// Configuration for a [`BucketArray`](crate::BucketArray).
///
/// Controls the growth increment and the size of the first bucket.
/// Validated at construction; immutable for the lifetime of the array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketArrayConfig {
    /// Default capacity (in elements) of every bucket the array allocates.
    ///
    /// Default: 64. Must be at least 1. Buckets may be larger when a single
    /// request needs more room than this.
    pub min_bucket_size: usize,

    /// Capacity hint for the first bucket.
    ///
    /// The first bucket holds `max(min_bucket_size, initial_capacity)`
    /// elements. Default: 0.
    pub initial_capacity: usize,
}

impl BucketArrayConfig {
    /// Default bucket size in elements.
    pub const DEFAULT_MIN_BUCKET_SIZE: usize = 64;

    /// Create a config with the default bucket size and no capacity hint.
    pub fn new() -> Self {
        Self {
            min_bucket_size: Self::DEFAULT_MIN_BUCKET_SIZE,
            initial_capacity: 0,
        }
    }

    /// Replace the growth increment.
    pub fn with_min_bucket_size(mut self, min_bucket_size: usize) -> Self {
        self.min_bucket_size = min_bucket_size;
        self
    }

    /// Replace the first-bucket capacity hint.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Capacity of the bucket allocated at construction.
    pub fn first_bucket_size(&self) -> usize {
        self.min_bucket_size.max(self.initial_capacity)
    }

    /// Check that the config describes a usable array.
    pub fn validate(&self) -> Result<(), BucketArrayError> {
        if self.min_bucket_size == 0 {
            return Err(BucketArrayError::InvalidConfig {
                reason: "min_bucket_size must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for BucketArrayConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bucket_size_is_64() {
        let config = BucketArrayConfig::default();
        assert_eq!(config.min_bucket_size, 64);
        assert_eq!(config.first_bucket_size(), 64);
    }

    #[test]
    fn initial_capacity_raises_first_bucket() {
        let config = BucketArrayConfig::new()
            .with_min_bucket_size(8)
            .with_initial_capacity(100);
        assert_eq!(config.first_bucket_size(), 100);
    }

    #[test]
    fn small_hint_does_not_shrink_first_bucket() {
        let config = BucketArrayConfig::new()
            .with_min_bucket_size(8)
            .with_initial_capacity(3);
        assert_eq!(config.first_bucket_size(), 8);
    }

    #[test]
    fn zero_bucket_size_rejected() {
        let config = BucketArrayConfig::new().with_min_bucket_size(0);
        assert!(matches!(
            config.validate(),
            Err(BucketArrayError::InvalidConfig { .. })
        ));
    }
}
