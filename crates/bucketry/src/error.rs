//! Bucket-array error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during bucket-array operations.
///
/// Only allocation and configuration problems are reported here. Contract
/// violations such as an out-of-range `remove_at` panic instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BucketArrayError {
    /// The arena refused to hand out a new bucket.
    AllocationFailed {
        /// Slot capacity of the bucket that was requested.
        capacity: usize,
        /// Size of the requested block in bytes.
        bytes: usize,
    },
    /// The requested bucket size does not fit in the address space.
    CapacityOverflow {
        /// Slot capacity of the bucket that was requested.
        capacity: usize,
    },
    /// A [`BucketArrayConfig`](crate::BucketArrayConfig) failed validation.
    InvalidConfig {
        /// Human-readable description of the rejected setting.
        reason: String,
    },
}

impl fmt::Display for BucketArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { capacity, bytes } => {
                write!(
                    f,
                    "bucket allocation failed: {capacity} slots ({bytes} bytes)"
                )
            }
            Self::CapacityOverflow { capacity } => {
                write!(f, "bucket capacity overflow: {capacity} slots")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid bucket array config: {reason}")
            }
        }
    }
}

impl Error for BucketArrayError {}
