//! Budgeted arena allocator for bucket storage.
//!
//! [`BoundedArena`] forwards every request to an inner allocator while
//! enforcing a fixed byte budget and keeping usage statistics. Buckets are
//! allocated once and released whole, so the arena only ever sees
//! `allocate`/`deallocate` pairs of matching size.
//!
//! Share one arena between several arrays by handing each a `&BoundedArena`;
//! `allocator_api2` implements [`Allocator`] for references.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator, Global};

/// Allocator with a hard byte budget and usage counters.
///
/// Counters use `Cell`, so an arena (and any array allocating from it by
/// reference) stays on one thread.
pub struct BoundedArena<A: Allocator = Global> {
    inner: A,
    /// Budget in bytes.
    size: usize,
    used: Cell<usize>,
    num_allocations: Cell<usize>,
    high_used_mark: Cell<usize>,
    resettable_high_used_mark: Cell<usize>,
}

impl BoundedArena<Global> {
    /// Create an arena over the global heap with a budget of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self::with_inner(Global, size)
    }
}

impl<A: Allocator> BoundedArena<A> {
    /// Create an arena that draws from `inner` with a budget of `size` bytes.
    pub fn with_inner(inner: A, size: usize) -> Self {
        Self {
            inner,
            size,
            used: Cell::new(0),
            num_allocations: Cell::new(0),
            high_used_mark: Cell::new(0),
            resettable_high_used_mark: Cell::new(0),
        }
    }

    /// Byte budget.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Bytes currently handed out.
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Bytes still available under the budget.
    pub fn remaining(&self) -> usize {
        self.size - self.used.get()
    }

    /// Number of live allocations.
    pub fn num_allocations(&self) -> usize {
        self.num_allocations.get()
    }

    /// Largest `used` value ever observed.
    pub fn high_used_mark(&self) -> usize {
        self.high_used_mark.get()
    }

    /// Largest `used` value since the last
    /// [`reset_high_used_mark`](Self::reset_high_used_mark).
    pub fn resettable_high_used_mark(&self) -> usize {
        self.resettable_high_used_mark.get()
    }

    /// Restart the resettable high-water mark from the current usage.
    pub fn reset_high_used_mark(&self) {
        self.resettable_high_used_mark.set(self.used.get());
    }

    fn record_alloc(&self, bytes: usize) {
        let used = self.used.get() + bytes;
        self.used.set(used);
        self.num_allocations.set(self.num_allocations.get() + 1);
        if used > self.high_used_mark.get() {
            self.high_used_mark.set(used);
        }
        if used > self.resettable_high_used_mark.get() {
            self.resettable_high_used_mark.set(used);
        }
    }
}

// SAFETY: every block comes from `inner` and is returned to `inner` with the
// layout it was requested with; the wrapper only adjusts counters.
unsafe impl<A: Allocator> Allocator for BoundedArena<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let bytes = layout.size();
        if bytes > self.remaining() {
            log::debug!(
                "arena budget exceeded: requested {bytes} bytes, {} of {} in use",
                self.used(),
                self.size
            );
            return Err(AllocError);
        }
        let block = self.inner.allocate(layout)?;
        self.record_alloc(bytes);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller guarantees `ptr` was allocated by this arena with
        // `layout`, and this arena forwards every allocation to `inner`.
        unsafe { self.inner.deallocate(ptr, layout) };
        self.used.set(self.used.get() - layout.size());
        self.num_allocations.set(self.num_allocations.get() - 1);
    }
}
