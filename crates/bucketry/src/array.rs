//! The bucket array: growth, insertion, removal and lookup.
//!
//! Defragmentation (`clear`, `solidify`, `sort`) lives in
//! [`compact`](crate::compact); this module owns the chain and its
//! bookkeeping.

use std::fmt;
use std::ops::{Index, IndexMut};

use allocator_api2::alloc::{Allocator, Global};

use crate::bucket::{Bucket, BucketStats};
use crate::config::BucketArrayConfig;
use crate::error::BucketArrayError;

/// A growable array whose elements never move when it grows.
///
/// Storage is a chain of fixed-capacity buckets. Appending fills the
/// *append target* bucket and allocates a new bucket once the chain runs
/// out of room; existing buckets are never reallocated. Removing an
/// element shifts only the later elements of its own bucket.
///
/// Indexed access walks the chain and costs O(bucket count).
///
/// # Fragmentation
///
/// Removing from a bucket that precedes the append target leaves a hole
/// that appends cannot reach. Those slots are counted by
/// [`useless_spaces`](Self::useless_spaces) and reclaimed by
/// [`solidify`](Self::solidify), or automatically when trailing buckets
/// empty out.
///
/// # Example
///
/// ```
/// use bucketry::{BucketArray, BucketArrayConfig};
///
/// let mut array = BucketArray::new(BucketArrayConfig::new().with_min_bucket_size(4))?;
/// let first: *const u32 = array.add(7)?;
/// for v in 0..100 {
///     array.add(v)?;
/// }
/// assert_eq!(array.contains_pointer(first, false), Some(0));
/// assert_eq!(array.get(0), Some(&7));
/// # Ok::<(), bucketry::BucketArrayError>(())
/// ```
pub struct BucketArray<T, A: Allocator + Clone = Global> {
    /// Buckets in chain order. Never empty.
    pub(crate) buckets: Vec<Bucket<T, A>>,
    pub(crate) alloc: A,
    pub(crate) min_bucket_size: usize,
    /// Sum of `used` over all buckets.
    pub(crate) length: usize,
    /// Index of the bucket appends currently write into.
    pub(crate) last_used_bucket: usize,
    /// Sum of free slots in buckets before `last_used_bucket`.
    pub(crate) useless_spaces: usize,
}

impl<T> BucketArray<T, Global> {
    /// Create an array on the global heap.
    pub fn new(config: BucketArrayConfig) -> Result<Self, BucketArrayError> {
        Self::new_in(config, Global)
    }
}

impl<T, A: Allocator + Clone> BucketArray<T, A> {
    /// Create an array whose buckets are allocated from `alloc`.
    ///
    /// Allocates the first bucket immediately, sized
    /// `max(min_bucket_size, initial_capacity)`.
    pub fn new_in(config: BucketArrayConfig, alloc: A) -> Result<Self, BucketArrayError> {
        config.validate()?;
        let first = Bucket::new(config.first_bucket_size(), alloc.clone())?;
        Ok(Self {
            buckets: vec![first],
            alloc,
            min_bucket_size: config.min_bucket_size,
            length: 0,
            last_used_bucket: 0,
            useless_spaces: 0,
        })
    }

    /// Release every bucket back to the arena, dropping all elements.
    ///
    /// Equivalent to dropping the array.
    pub fn free(self) {
        log::trace!(
            "freeing bucket array: {} buckets, {} items",
            self.buckets.len(),
            self.length
        );
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of buckets in the chain.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total slots allocated across all buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.iter().map(Bucket::capacity).sum()
    }

    /// Default capacity of newly allocated buckets.
    pub fn min_bucket_size(&self) -> usize {
        self.min_bucket_size
    }

    /// Free slots in buckets before the append target.
    ///
    /// These slots cannot be reached by `add` until the array is solidified
    /// or the buckets after them empty out.
    pub fn useless_spaces(&self) -> usize {
        self.useless_spaces
    }

    /// Index (in chain order) of the bucket that appends write into.
    pub fn last_used_bucket_index(&self) -> usize {
        self.last_used_bucket
    }

    /// Per-bucket occupancy in chain order.
    pub fn bucket_stats(&self) -> impl Iterator<Item = BucketStats> + '_ {
        self.buckets.iter().map(Bucket::stats)
    }

    /// The allocator buckets are drawn from.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    // ── Growth ──────────────────────────────────────────────────────

    /// Ensure the buckets from the append target onward have at least
    /// `additional` free slots.
    ///
    /// Appends at most one bucket, sized `max(min_bucket_size, deficit)`.
    /// Existing buckets never move.
    pub fn expand(&mut self, additional: usize) -> Result<(), BucketArrayError> {
        if additional == 0 {
            return Ok(());
        }
        let available: usize = self.buckets[self.last_used_bucket..]
            .iter()
            .map(Bucket::room)
            .sum();
        if available < additional {
            let capacity = self.min_bucket_size.max(additional - available);
            let bucket = Bucket::new(capacity, self.alloc.clone())?;
            self.buckets.push(bucket);
        }
        Ok(())
    }

    // ── Insertion ───────────────────────────────────────────────────

    /// Append `value` and return a reference to its slot.
    ///
    /// The slot's address stays fixed until the element is removed, an
    /// element before it in the same bucket is removed, or the array is
    /// solidified or sorted.
    pub fn add(&mut self, value: T) -> Result<&mut T, BucketArrayError> {
        self.expand(1)?;
        let (bucket, offset) = self.push_reserved(value);
        Ok(&mut self.buckets[bucket].as_mut_slice()[offset])
    }

    /// Append `T::default()` and return a reference to its slot.
    pub fn add_default(&mut self) -> Result<&mut T, BucketArrayError>
    where
        T: Default,
    {
        self.add(T::default())
    }

    /// Append every element of `items`.
    ///
    /// Returns the first physically contiguous run of new elements. With
    /// `must_be_consecutive` that run is the whole batch: buckets too small
    /// to take the batch in one piece are skipped, and their spare slots
    /// become [`useless_spaces`](Self::useless_spaces). Without it the batch
    /// may straddle buckets and later elements must be reached by index.
    ///
    /// On allocation failure nothing is added.
    ///
    /// The batch size must be known up front. `Range<u64>` is not an
    /// `ExactSizeIterator`; collect it or map from a narrower range.
    pub fn add_bulk<I>(
        &mut self,
        items: I,
        must_be_consecutive: bool,
    ) -> Result<&mut [T], BucketArrayError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        let count = items.len();
        if count == 0 {
            return Ok(Default::default());
        }
        if must_be_consecutive {
            self.add_consecutive(items, count)
        } else {
            self.add_scattered(items, count)
        }
    }

    /// Append `count` default elements. See [`add_bulk`](Self::add_bulk).
    pub fn add_bulk_default(
        &mut self,
        count: usize,
        must_be_consecutive: bool,
    ) -> Result<&mut [T], BucketArrayError>
    where
        T: Default,
    {
        self.add_bulk((0..count).map(|_| T::default()), must_be_consecutive)
    }

    fn add_scattered<I>(&mut self, items: I, count: usize) -> Result<&mut [T], BucketArrayError>
    where
        I: Iterator<Item = T>,
    {
        self.expand(count)?;
        let mut first: Option<(usize, usize)> = None;
        let mut run_len = 0;
        for item in items.take(count) {
            let (bucket, offset) = self.push_reserved(item);
            match first {
                None => {
                    first = Some((bucket, offset));
                    run_len = 1;
                }
                Some((run_bucket, _)) if run_bucket == bucket => run_len += 1,
                Some(_) => {}
            }
        }
        match first {
            Some((bucket, offset)) => {
                Ok(&mut self.buckets[bucket].as_mut_slice()[offset..offset + run_len])
            }
            None => Ok(Default::default()),
        }
    }

    fn add_consecutive<I>(&mut self, items: I, count: usize) -> Result<&mut [T], BucketArrayError>
    where
        I: Iterator<Item = T>,
    {
        // Locate (or allocate) the target before touching any bookkeeping so
        // a failed allocation leaves the array unchanged.
        let fits = self.buckets[self.last_used_bucket..]
            .iter()
            .position(|bucket| bucket.room() >= count)
            .map(|pos| self.last_used_bucket + pos);
        let target = match fits {
            Some(target) => target,
            None => {
                let bucket = Bucket::new(self.min_bucket_size.max(count), self.alloc.clone())?;
                self.buckets.push(bucket);
                self.buckets.len() - 1
            }
        };

        let skipped: usize = self.buckets[self.last_used_bucket..target]
            .iter()
            .map(Bucket::room)
            .sum();
        if target > self.last_used_bucket {
            log::trace!(
                "consecutive insert of {count} skipped buckets {}..{target}, {skipped} slots now useless",
                self.last_used_bucket
            );
        }
        self.useless_spaces += skipped;
        self.last_used_bucket = target;

        // `length` tracks every push so a panicking source leaves it in step
        // with the bucket.
        let start = self.buckets[target].used();
        for item in items.take(count) {
            self.buckets[target].push(item);
            self.length += 1;
        }
        let added = self.buckets[target].used() - start;
        Ok(&mut self.buckets[target].as_mut_slice()[start..start + added])
    }

    /// Place `value` in the append target, advancing past a full target.
    ///
    /// Room must already have been reserved with [`expand`](Self::expand).
    fn push_reserved(&mut self, value: T) -> (usize, usize) {
        if self.buckets[self.last_used_bucket].is_full() {
            self.last_used_bucket += 1;
        }
        let bucket = self.last_used_bucket;
        let offset = self.buckets[bucket].push(value);
        self.length += 1;
        (bucket, offset)
    }

    // ── Removal ─────────────────────────────────────────────────────

    /// Remove and return the element at `index`.
    ///
    /// Later elements in the same bucket shift down by one slot; elements
    /// in other buckets do not move.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> T {
        let Some((bucket_index, offset)) = self.locate(index) else {
            panic!(
                "remove_at index {index} out of bounds for bucket array of length {}",
                self.length
            );
        };
        let value = self.buckets[bucket_index].remove(offset);
        self.length -= 1;

        let emptied = self.buckets[bucket_index].is_empty();
        if bucket_index < self.last_used_bucket {
            // The freed slot sits behind the append target.
            self.useless_spaces += 1;
            if emptied {
                self.move_empty_bucket_to_end(bucket_index);
            }
        } else {
            debug_assert_eq!(bucket_index, self.last_used_bucket);
            if emptied {
                self.refresh_last_used_bucket();
            }
        }
        value
    }

    /// Remove and return the last element, or `None` if the array is empty.
    pub fn remove_last(&mut self) -> Option<T> {
        if self.length == 0 {
            return None;
        }
        Some(self.remove_at(self.length - 1))
    }

    /// Relink an emptied bucket from before the append target to the tail,
    /// where growth can use it again.
    fn move_empty_bucket_to_end(&mut self, bucket_index: usize) {
        debug_assert!(bucket_index < self.last_used_bucket);
        debug_assert!(self.buckets[bucket_index].is_empty());
        let bucket = self.buckets.remove(bucket_index);
        let capacity = bucket.capacity();
        self.buckets.push(bucket);
        self.last_used_bucket -= 1;
        self.useless_spaces -= capacity;
        log::trace!("moved empty bucket {bucket_index} ({capacity} slots) to end of chain");
    }

    /// Walk the append target back over empty buckets.
    ///
    /// Each bucket that becomes the target stops counting toward
    /// `useless_spaces`.
    fn refresh_last_used_bucket(&mut self) {
        let mut stepped = false;
        loop {
            let bucket = &self.buckets[self.last_used_bucket];
            if stepped {
                self.useless_spaces -= bucket.room();
            }
            if bucket.is_empty() && self.last_used_bucket > 0 {
                self.last_used_bucket -= 1;
                stepped = true;
            } else {
                return;
            }
        }
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Bucket index and in-bucket offset of logical `index`.
    pub(crate) fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.length {
            return None;
        }
        let mut base = 0;
        for (bucket_index, bucket) in self.buckets.iter().enumerate() {
            if index < base + bucket.used() {
                return Some((bucket_index, index - base));
            }
            base += bucket.used();
        }
        None
    }

    /// Reference to the element at `index`, or `None` if out of range.
    ///
    /// Walks the chain: O(bucket count).
    pub fn get(&self, index: usize) -> Option<&T> {
        let (bucket, offset) = self.locate(index)?;
        self.buckets[bucket].as_slice().get(offset)
    }

    /// Mutable reference to the element at `index`, or `None` if out of range.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (bucket, offset) = self.locate(index)?;
        self.buckets[bucket].as_mut_slice().get_mut(offset)
    }

    /// Logical index of the element `ptr` points at, if it lies in this
    /// array's storage.
    ///
    /// Strict mode (`lenient == false`) requires `ptr` to address the start
    /// of a live element. Lenient mode accepts any address inside a
    /// bucket's allocated slots, including free trailing slots and
    /// misaligned addresses; the reported index is then the slot the
    /// address falls in and may be `>= len()`.
    ///
    /// Always `None` for zero-sized `T`.
    pub fn contains_pointer(&self, ptr: *const T, lenient: bool) -> Option<usize> {
        let item_size = std::mem::size_of::<T>();
        if item_size == 0 {
            return None;
        }
        let addr = ptr.addr();
        let mut base = 0;
        for bucket in &self.buckets {
            let start = bucket.base_addr();
            let end = start + bucket.capacity() * item_size;
            if (start..end).contains(&addr) {
                let offset = addr - start;
                let slot = offset / item_size;
                if !lenient && (offset % item_size != 0 || slot >= bucket.used()) {
                    return None;
                }
                return Some(base + slot);
            }
            base += bucket.used();
        }
        None
    }

    // ── Iteration ───────────────────────────────────────────────────

    /// Iterate over the elements in logical order.
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            buckets: self.buckets.iter(),
            current: Default::default(),
            remaining: self.length,
        }
    }

    /// Iterate mutably over the elements in logical order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, A> {
        IterMut {
            buckets: self.buckets.iter_mut(),
            current: Default::default(),
            remaining: self.length,
        }
    }
}

/// Iterator over shared references, created by [`BucketArray::iter`].
pub struct Iter<'a, T, A: Allocator = Global> {
    buckets: std::slice::Iter<'a, Bucket<T, A>>,
    current: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T, A: Allocator> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.current.next() {
                self.remaining -= 1;
                return Some(item);
            }
            self.current = self.buckets.next()?.as_slice().iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, A: Allocator> ExactSizeIterator for Iter<'_, T, A> {}

/// Iterator over mutable references, created by [`BucketArray::iter_mut`].
pub struct IterMut<'a, T, A: Allocator = Global> {
    buckets: std::slice::IterMut<'a, Bucket<T, A>>,
    current: std::slice::IterMut<'a, T>,
    remaining: usize,
}

impl<'a, T, A: Allocator> Iterator for IterMut<'a, T, A> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        loop {
            if let Some(item) = self.current.next() {
                self.remaining -= 1;
                return Some(item);
            }
            self.current = self.buckets.next()?.as_mut_slice().iter_mut();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, A: Allocator> ExactSizeIterator for IterMut<'_, T, A> {}

impl<T, A: Allocator + Clone> Index<usize> for BucketArray<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let length = self.length;
        match self.get(index) {
            Some(item) => item,
            None => panic!("index {index} out of bounds for bucket array of length {length}"),
        }
    }
}

impl<T, A: Allocator + Clone> IndexMut<usize> for BucketArray<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let length = self.length;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("index {index} out of bounds for bucket array of length {length}"),
        }
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a BucketArray<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Iter<'a, T, A> {
        self.iter()
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a mut BucketArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, A>;

    fn into_iter(self) -> IterMut<'a, T, A> {
        self.iter_mut()
    }
}

impl<T: fmt::Debug, A: Allocator + Clone> fmt::Debug for BucketArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
