//! Fixed-capacity buckets, the storage unit of a bucket array.
//!
//! A [`Bucket`] is one block of `capacity` slots obtained from the arena in a
//! single allocation. Live elements always form the prefix `[0, used)`; the
//! block is never grown, so pushing into a bucket with spare room never moves
//! the elements already in it.

use allocator_api2::alloc::Allocator;
use allocator_api2::vec::Vec as BlockVec;

use crate::error::BucketArrayError;

/// A single fixed-capacity block of slots.
pub(crate) struct Bucket<T, A: Allocator> {
    /// Backing block. Its length is the bucket's `used` count.
    items: BlockVec<T, A>,
    /// Number of slots requested from the arena. The block may be larger,
    /// but the bucket never fills past this.
    capacity: usize,
}

impl<T, A: Allocator> Bucket<T, A> {
    /// Allocate a bucket with room for exactly `capacity` elements.
    ///
    /// Fails without side effects if the arena cannot supply the block.
    pub(crate) fn new(capacity: usize, alloc: A) -> Result<Self, BucketArrayError> {
        let bytes = capacity
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(BucketArrayError::CapacityOverflow { capacity })?;
        let mut items = BlockVec::new_in(alloc);
        if let Err(err) = items.try_reserve_exact(capacity) {
            log::warn!("bucket allocation of {capacity} slots ({bytes} bytes) failed: {err:?}");
            return Err(BucketArrayError::AllocationFailed { capacity, bytes });
        }
        log::debug!("allocated bucket: {capacity} slots, {bytes} bytes");
        Ok(Self { items, capacity })
    }

    /// Append into the first free slot, returning its offset.
    ///
    /// # Panics
    ///
    /// Panics if the bucket is full. Callers check [`room`](Self::room) first.
    pub(crate) fn push(&mut self, value: T) -> usize {
        assert!(!self.is_full(), "push into a full bucket");
        let offset = self.items.len();
        self.items.push(value);
        offset
    }

    /// Remove the element at `offset`, shifting the rest of this bucket down.
    pub(crate) fn remove(&mut self, offset: usize) -> T {
        self.items.remove(offset)
    }

    /// Move the first `count` elements of `source` onto the end of `self`.
    ///
    /// The remainder of `source` shifts to the front of its own block.
    pub(crate) fn take_front(&mut self, source: &mut Self, count: usize) {
        debug_assert!(count <= self.room() && count <= source.used());
        self.items.extend(source.items.drain(..count));
    }

    /// Drop every element without releasing the block.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of live elements.
    pub(crate) fn used(&self) -> usize {
        self.items.len()
    }

    /// Slot capacity requested at creation.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots after the live prefix.
    pub(crate) fn room(&self) -> usize {
        self.capacity - self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Start address of the block.
    pub(crate) fn base_addr(&self) -> usize {
        self.items.as_ptr().addr()
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub(crate) fn stats(&self) -> BucketStats {
        BucketStats {
            capacity: self.capacity,
            used: self.items.len(),
        }
    }
}

/// Occupancy snapshot of one bucket, reported in chain order by
/// [`BucketArray::bucket_stats`](crate::BucketArray::bucket_stats).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketStats {
    /// Slots allocated for the bucket.
    pub capacity: usize,
    /// Live elements, always stored in the first `used` slots.
    pub used: usize,
}

impl BucketStats {
    /// Free trailing slots.
    pub fn room(&self) -> usize {
        self.capacity - self.used
    }
}
