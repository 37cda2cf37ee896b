//! Test utilities for bucketry development.
//!
//! Provides an analytic invariant checker for [`BucketArray`], a
//! [`ModelHarness`] that drives an array and a plain `Vec` through the same
//! scripted operations, and drop-tracking fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use bucketry::{Allocator, BucketArray, BucketArrayConfig, BucketStats};

/// Recompute the array's bookkeeping from its buckets and compare.
///
/// Checks that `len` equals the sum of bucket occupancy, that the append
/// target is in range with nothing stored after it, and that
/// `useless_spaces` equals the free slots of every bucket before the target.
pub fn check_invariants<T, A: Allocator + Clone>(array: &BucketArray<T, A>) -> Result<(), String> {
    let stats: Vec<BucketStats> = array.bucket_stats().collect();
    if stats.is_empty() {
        return Err("bucket chain is empty".into());
    }
    if stats.len() != array.bucket_count() {
        return Err(format!(
            "bucket_count {} but {} buckets reported",
            array.bucket_count(),
            stats.len()
        ));
    }
    let target = array.last_used_bucket_index();
    if target >= stats.len() {
        return Err(format!(
            "append target {target} out of range for {} buckets",
            stats.len()
        ));
    }
    let total: usize = stats.iter().map(|s| s.used).sum();
    if total != array.len() {
        return Err(format!("len {} but buckets hold {total}", array.len()));
    }
    for (i, s) in stats.iter().enumerate() {
        if s.used > s.capacity {
            return Err(format!("bucket {i} holds {} of {}", s.used, s.capacity));
        }
        if i > target && s.used != 0 {
            return Err(format!(
                "bucket {i} after append target {target} holds {} items",
                s.used
            ));
        }
    }
    let useless: usize = stats[..target].iter().map(BucketStats::room).sum();
    if useless != array.useless_spaces() {
        return Err(format!(
            "useless_spaces {} but buckets before target {target} have {useless} free slots",
            array.useless_spaces()
        ));
    }
    Ok(())
}

/// Panicking form of [`check_invariants`].
pub fn assert_invariants<T, A: Allocator + Clone>(array: &BucketArray<T, A>) {
    if let Err(reason) = check_invariants(array) {
        panic!("bucket array invariant violated: {reason}");
    }
}

/// One step of a scripted workload.
///
/// Index-taking operations carry a seed that is reduced modulo the current
/// length, so any sequence is valid against any array state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    AddBulk { count: usize, consecutive: bool },
    RemoveAt { seed: usize },
    RemoveLast,
    Clear { reduce: bool },
    Solidify { deallocate: bool, single_bucket: bool },
    Sort,
}

/// Runs a [`BucketArray`] and a `Vec` reference model in lockstep.
///
/// Values are assigned from an increasing counter so every element is
/// distinct and order mistakes show up as value mismatches.
pub struct ModelHarness {
    pub array: BucketArray<u64>,
    pub model: Vec<u64>,
    next: u64,
}

impl ModelHarness {
    pub fn new(min_bucket_size: usize) -> Self {
        let config = BucketArrayConfig::new().with_min_bucket_size(min_bucket_size);
        Self {
            array: BucketArray::new(config).expect("global allocation"),
            model: Vec::new(),
            next: 0,
        }
    }

    /// Apply `op` to both the array and the model.
    pub fn apply(&mut self, op: &Op) {
        match *op {
            Op::Add => {
                let value = self.take_value();
                self.array.add(value).expect("global allocation");
                self.model.push(value);
            }
            Op::AddBulk { count, consecutive } => {
                let batch: Vec<u64> = (0..count).map(|_| self.take_value()).collect();
                self.array
                    .add_bulk(batch.iter().copied(), consecutive)
                    .expect("global allocation");
                self.model.extend(batch);
            }
            Op::RemoveAt { seed } => {
                if !self.model.is_empty() {
                    let index = seed % self.model.len();
                    let removed = self.array.remove_at(index);
                    assert_eq!(removed, self.model.remove(index), "remove_at({index})");
                }
            }
            Op::RemoveLast => {
                assert_eq!(self.array.remove_last(), self.model.pop());
            }
            Op::Clear { reduce } => {
                self.array.clear(reduce);
                self.model.clear();
            }
            Op::Solidify {
                deallocate,
                single_bucket,
            } => {
                self.array
                    .solidify(deallocate, single_bucket)
                    .expect("global allocation");
            }
            Op::Sort => {
                self.array.sort().expect("global allocation");
                self.model.sort_unstable();
            }
        }
    }

    /// Assert the array matches the model and its invariants hold.
    pub fn verify(&self) {
        assert_invariants(&self.array);
        let contents: Vec<u64> = self.array.iter().copied().collect();
        assert_eq!(contents, self.model);
        for (i, expected) in self.model.iter().enumerate() {
            assert_eq!(self.array.get(i), Some(expected), "get({i})");
        }
        assert_eq!(self.array.get(self.model.len()), None);
    }

    fn take_value(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }
}
