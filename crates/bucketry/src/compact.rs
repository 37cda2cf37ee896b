//! Defragmentation: clearing, solidifying and sorting.
//!
//! Unlike the rest of the API, [`solidify`](BucketArray::solidify) and the
//! sort family move elements between buckets. Every element address taken
//! before one of these calls is invalid afterwards.

use std::cmp::Ordering;

use allocator_api2::alloc::Allocator;

use crate::array::BucketArray;
use crate::bucket::Bucket;
use crate::error::BucketArrayError;

impl<T, A: Allocator + Clone> BucketArray<T, A> {
    /// Drop every element and reset the bookkeeping.
    ///
    /// Buckets are kept for reuse unless `reduce_to_single_bucket` is set,
    /// in which case all but the first are released.
    pub fn clear(&mut self, reduce_to_single_bucket: bool) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.length = 0;
        self.useless_spaces = 0;
        self.last_used_bucket = 0;
        if reduce_to_single_bucket {
            let released = self.buckets.len() - 1;
            self.buckets.truncate(1);
            log::debug!("cleared bucket array, released {released} buckets");
        }
    }

    /// Remove every hole from the array.
    ///
    /// With `single_bucket`, all elements move into one freshly allocated
    /// bucket sized to the current length (or `min_bucket_size` when empty)
    /// and the old buckets are released. If that allocation fails the array
    /// is left untouched.
    ///
    /// Otherwise elements are compacted forward in place: bucket count and
    /// capacities stay the same, every bucket before the new append target
    /// ends up full, and with `deallocate_empty_buckets` the empty buckets
    /// left at the tail are released (the first bucket is always kept).
    ///
    /// Either way `useless_spaces` drops to zero and all previously taken
    /// element addresses become invalid.
    pub fn solidify(
        &mut self,
        deallocate_empty_buckets: bool,
        single_bucket: bool,
    ) -> Result<(), BucketArrayError> {
        if single_bucket {
            self.solidify_into_one()?;
        } else {
            self.compact_in_place();
            if deallocate_empty_buckets {
                let keep = self.last_used_bucket + 1;
                let released = self.buckets.len() - keep;
                self.buckets.truncate(keep);
                log::trace!("released {released} empty buckets after compaction");
            }
        }
        log::debug!(
            "solidified bucket array: {} items in {} buckets",
            self.length,
            self.buckets.len()
        );
        Ok(())
    }

    fn solidify_into_one(&mut self) -> Result<(), BucketArrayError> {
        let capacity = if self.length == 0 {
            self.min_bucket_size
        } else {
            self.length
        };
        let mut merged = Bucket::new(capacity, self.alloc.clone())?;
        for bucket in &mut self.buckets {
            let used = bucket.used();
            merged.take_front(bucket, used);
        }
        self.buckets.clear();
        self.buckets.push(merged);
        self.last_used_bucket = 0;
        self.useless_spaces = 0;
        Ok(())
    }

    /// Two-pointer copy-forward pass: `dest` walks the chain filling each
    /// bucket's free tail from the first non-empty bucket after it.
    fn compact_in_place(&mut self) {
        let count = self.buckets.len();
        let mut source = 1;
        for dest in 0..count {
            source = source.max(dest + 1);
            while source < count && !self.buckets[dest].is_full() {
                let (head, tail) = self.buckets.split_at_mut(source);
                let (to, from) = (&mut head[dest], &mut tail[0]);
                let moved = to.room().min(from.used());
                to.take_front(from, moved);
                if from.is_empty() {
                    source += 1;
                }
            }
        }
        self.last_used_bucket = self
            .buckets
            .iter()
            .rposition(|bucket| !bucket.is_empty())
            .unwrap_or(0);
        self.useless_spaces = 0;
    }

    /// Sort the elements with `compare`.
    ///
    /// The array is first solidified into a single bucket, so this breaks
    /// element addresses exactly like [`solidify`](Self::solidify). The sort
    /// is unstable.
    pub fn sort_by<F>(&mut self, compare: F) -> Result<(), BucketArrayError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.solidify(true, true)?;
        debug_assert_eq!(self.buckets.len(), 1);
        self.buckets[0].as_mut_slice().sort_unstable_by(compare);
        Ok(())
    }

    /// Sort the elements in ascending order. See [`sort_by`](Self::sort_by).
    pub fn sort(&mut self) -> Result<(), BucketArrayError>
    where
        T: Ord,
    {
        self.sort_by(T::cmp)
    }

    /// Sort the elements by the key `f` extracts. See [`sort_by`](Self::sort_by).
    pub fn sort_by_key<K, F>(&mut self, mut f: F) -> Result<(), BucketArrayError>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(|a, b| f(a).cmp(&f(b)))
    }
}
