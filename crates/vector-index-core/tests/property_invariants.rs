//! Property-based tests for the invariants in §8.1.

use proptest::prelude::*;
use vector_index_core::queue::{BoundedBestQueue, Record};
use vector_index_core::{l2_distance, Error};

proptest! {
    /// `BoundedBestQueue(C)` never exceeds `C` entries, and its worst
    /// element is always the maximum distance among current members.
    #[test]
    fn capacity_never_exceeded_and_worst_is_max(
        capacity in 1usize..16,
        distances in proptest::collection::vec(0.0f64..1000.0, 0..64),
    ) {
        let mut queue: BoundedBestQueue<usize> = BoundedBestQueue::new(capacity);
        for (id, distance) in distances.iter().enumerate() {
            queue.insert(Record { item: id, distance: *distance });
        }
        prop_assert!(queue.len() <= capacity);
        if let Some(worst) = queue.peek_worst() {
            let max = queue.records().map(|r| r.distance).fold(f64::MIN, f64::max);
            prop_assert!((worst.distance - max).abs() < f64::EPSILON);
        }
    }

    /// `records()` is always ordered ascending by distance.
    #[test]
    fn records_view_is_ascending(
        distances in proptest::collection::vec(0.0f64..1000.0, 0..64),
    ) {
        let mut queue: BoundedBestQueue<usize> = BoundedBestQueue::new(usize::MAX);
        for (id, distance) in distances.iter().enumerate() {
            queue.insert(Record { item: id, distance: *distance });
        }
        let collected: Vec<f64> = queue.records().map(|r| r.distance).collect();
        for pair in collected.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
    }

    /// L2 distance is non-negative for any pair of equal-length vectors,
    /// and zero for a vector against itself.
    #[test]
    fn l2_distance_is_non_negative_and_self_distance_is_zero(
        a in proptest::collection::vec(-1000.0f32..1000.0, 1..16),
        b in proptest::collection::vec(-1000.0f32..1000.0, 1..16),
    ) {
        prop_assume!(a.len() == b.len());
        prop_assert!(l2_distance(&a, &a) < 1e-6);
        prop_assert!(l2_distance(&a, &b) >= 0.0);
    }
}

#[test]
fn hnsw_search_rejects_dimension_mismatch() {
    use vector_index_core::index::hnsw::{HnswIndex, HnswParams, SearchParams};
    let index = HnswIndex::build(&[vec![0.0, 0.0]], HnswParams::default()).unwrap();
    let err = index
        .knn_search(&[0.0, 0.0, 0.0], 1, SearchParams { ef_search: 10 })
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}
