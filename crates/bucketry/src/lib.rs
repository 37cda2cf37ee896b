//! Growable bucket arrays with stable element addresses.
//!
//! A [`BucketArray`] stores its elements in a chain of fixed-capacity
//! buckets. Growing the array appends a bucket instead of reallocating, so
//! references and raw pointers to existing elements stay valid while new
//! elements are added. The price is O(bucket count) indexed access.
//!
//! # Architecture
//!
//! ```text
//! BucketArray<T, A> (bookkeeping: length, append target, useless spaces)
//! └── Vec<Bucket<T, A>> in chain order
//!     └── Bucket: one fixed block of `capacity` slots from allocator `A`
//! ```
//!
//! Buckets are drawn from any [`allocator_api2`] allocator. [`BoundedArena`]
//! wraps one with a byte budget and usage statistics, which makes
//! allocation failure observable: every fallible operation returns
//! [`BucketArrayError`] and leaves the array unchanged on failure.
//!
//! # Address stability
//!
//! | Operation | Moves existing elements? |
//! |-----------|--------------------------|
//! | `add`, `add_bulk`, `expand` | never |
//! | `remove_at(i)` | only later elements of the same bucket |
//! | `clear` | drops everything |
//! | `solidify`, `sort*` | everything |
//!
//! # Unsafe code
//!
//! Confined to [`arena`], which implements the `Allocator` trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod array;
mod bucket;
pub mod compact;
pub mod config;
pub mod error;

// Public re-exports for the primary API surface.
pub use allocator_api2::alloc::{Allocator, Global};
pub use arena::BoundedArena;
pub use array::{BucketArray, Iter, IterMut};
pub use bucket::BucketStats;
pub use config::BucketArrayConfig;
pub use error::BucketArrayError;
