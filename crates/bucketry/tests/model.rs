//! Integration test: random operation sequences against a `Vec` model.
//!
//! Every step re-derives the bookkeeping (length, append target, useless
//! spaces) from the bucket occupancy and compares the full contents.

use bucketry::{BucketArray, BucketArrayConfig};
use bucketry_test_utils::{assert_invariants, check_invariants, ModelHarness, Op};
use proptest::prelude::*;

#[test]
fn walkthrough_with_four_slot_buckets() {
    let mut array: BucketArray<u32> =
        BucketArray::new(BucketArrayConfig::new().with_min_bucket_size(4)).unwrap();
    for v in 0..=3 {
        array.add(v).unwrap();
    }
    assert_eq!(array.bucket_count(), 1);

    array.add(4).unwrap();
    assert_eq!(array.bucket_count(), 2);
    assert_eq!(array.last_used_bucket_index(), 1);
    assert_invariants(&array);

    assert_eq!(array.remove_at(0), 0);
    assert_eq!(array.useless_spaces(), 1);
    assert_eq!(array.get(0), Some(&1));
    assert_invariants(&array);

    array.solidify(true, true).unwrap();
    assert_eq!(array.bucket_count(), 1);
    assert_eq!(array.useless_spaces(), 0);
    assert_eq!(array.capacity(), 4);
    let items: Vec<u32> = array.iter().copied().collect();
    assert_eq!(items, vec![1, 2, 3, 4]);
    assert_invariants(&array);
}

#[test]
fn consecutive_insert_survives_panicking_source() {
    let mut harness = ModelHarness::new(8);
    harness.apply(&Op::Add);
    let array = &mut harness.array;
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let items = vec![100u64, 101, 102].into_iter().map(|v| {
            if v == 102 {
                panic!("source failed");
            }
            v
        });
        let _ = array.add_bulk(items, true);
    }));
    assert!(result.is_err());
    assert!(check_invariants(&harness.array).is_ok());
    harness.model.extend([100, 101]);
    harness.verify();

    harness.apply(&Op::RemoveLast);
    harness.apply(&Op::AddBulk {
        count: 9,
        consecutive: true,
    });
    harness.verify();
}

#[test]
fn holes_behind_target_are_reclaimed_by_compaction() {
    let mut harness = ModelHarness::new(4);
    for _ in 0..12 {
        harness.apply(&Op::Add);
    }
    // Buckets [0..4] [4..8] [8..12]; the first two removals land behind the target.
    for seed in [0, 3, 6] {
        harness.apply(&Op::RemoveAt { seed });
    }
    assert_eq!(harness.array.useless_spaces(), 2);
    harness.verify();

    harness.apply(&Op::Solidify {
        deallocate: true,
        single_bucket: false,
    });
    assert_eq!(harness.array.useless_spaces(), 0);
    assert_eq!(harness.array.bucket_count(), 3);
    let used: Vec<usize> = harness.array.bucket_stats().map(|s| s.used).collect();
    assert_eq!(used, vec![4, 4, 1]);
    harness.verify();
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => Just(Op::Add),
        2 => (0usize..10, any::<bool>())
            .prop_map(|(count, consecutive)| Op::AddBulk { count, consecutive }),
        5 => any::<usize>().prop_map(|seed| Op::RemoveAt { seed }),
        2 => Just(Op::RemoveLast),
        1 => any::<bool>().prop_map(|reduce| Op::Clear { reduce }),
        1 => (any::<bool>(), any::<bool>()).prop_map(|(deallocate, single_bucket)| {
            Op::Solidify { deallocate, single_bucket }
        }),
        1 => Just(Op::Sort),
    ]
}

proptest! {
    #[test]
    fn random_workloads_match_model(
        min_bucket_size in 1usize..8,
        ops in proptest::collection::vec(op(), 1..200),
    ) {
        let mut harness = ModelHarness::new(min_bucket_size);
        for op in &ops {
            harness.apply(op);
            harness.verify();
        }
    }

    #[test]
    fn solidify_always_clears_useless_spaces(
        min_bucket_size in 1usize..6,
        ops in proptest::collection::vec(op(), 1..80),
        single_bucket in any::<bool>(),
    ) {
        let mut harness = ModelHarness::new(min_bucket_size);
        for op in &ops {
            harness.apply(op);
        }
        harness.apply(&Op::Solidify { deallocate: true, single_bucket });
        prop_assert_eq!(harness.array.useless_spaces(), 0);
        let target = harness.array.last_used_bucket_index();
        for (i, stats) in harness.array.bucket_stats().enumerate().take(target) {
            prop_assert_eq!(stats.room(), 0, "bucket {} before target is not full", i);
        }
        prop_assert_eq!(harness.array.bucket_count(), target + 1);
        harness.verify();
    }
}
