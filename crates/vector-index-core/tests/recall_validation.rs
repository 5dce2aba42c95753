//! End-to-end recall validation (§8.3 scenario 6, §8.2 round-trip).
//!
//! These tests build each engine over a synthetic random dataset and check
//! its quality against a brute-force oracle, rather than asserting on
//! implementation internals.

use vector_index_core::index::hnsw::{HnswIndex, HnswParams, SearchParams as HnswSearchParams};
use vector_index_core::index::sa_tree::SaTree;
use vector_index_core::index::swng::{SwngIndex, SwngParams};
use vector_index_core::Rng;

/// Deterministic pseudo-random vectors for reproducible recall tests.
fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = Rng::seeded(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.uniform_f64() as f32).collect())
        .collect()
}

fn brute_force_knn(vectors: &[Vec<f32>], query: &[f32], k: usize) -> Vec<usize> {
    let mut distances: Vec<(usize, f64)> = vectors
        .iter()
        .enumerate()
        .map(|(id, v)| (id, vector_index_core::l2_distance(query, v)))
        .collect();
    distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    distances.truncate(k);
    distances.into_iter().map(|(id, _)| id).collect()
}

fn recall_at_k(retrieved: &[usize], truth: &[usize]) -> f64 {
    let truth_set: std::collections::HashSet<_> = truth.iter().collect();
    let hits = retrieved.iter().filter(|id| truth_set.contains(id)).count();
    hits as f64 / truth.len() as f64
}

#[test]
fn hnsw_recall_at_10_on_10k_random_vectors() {
    // §8.3 scenario 6: 10k vectors in R^32, 100 queries, recall@10 >= 0.95.
    let dim = 32;
    let vectors = random_vectors(10_000, dim, 1);
    let queries = random_vectors(100, dim, 2);

    let params = HnswParams {
        m: 16,
        m0: 32,
        ef_construction: 100,
        seed: 7,
    };
    let index = HnswIndex::build(&vectors, params).unwrap();

    let mut total_recall = 0.0;
    for query in &queries {
        let result = index
            .knn_search(query, 10, HnswSearchParams { ef_search: 100 })
            .unwrap();
        let retrieved: Vec<usize> = result.neighbors.iter().map(|(id, _)| *id).collect();
        let truth = brute_force_knn(&vectors, query, 10);
        total_recall += recall_at_k(&retrieved, &truth);
    }
    let avg_recall = total_recall / queries.len() as f64;
    assert!(
        avg_recall >= 0.95,
        "expected recall@10 >= 0.95, got {avg_recall}"
    );
}

#[test]
fn hnsw_recall_is_non_decreasing_in_ef_search() {
    // §8.1: recall@k against brute force is non-decreasing in
    // efSearch, statistically rather than strictly, so we compare small
    // vs. large ef over several queries and require the average not to
    // regress.
    let dim = 24;
    let vectors = random_vectors(3_000, dim, 11);
    let queries = random_vectors(30, dim, 12);
    let index = HnswIndex::build(
        &vectors,
        HnswParams {
            m: 16,
            m0: 32,
            ef_construction: 80,
            seed: 3,
        },
    )
    .unwrap();

    let recall_for = |ef_search: usize| -> f64 {
        let mut total = 0.0;
        for query in &queries {
            let result = index
                .knn_search(query, 10, HnswSearchParams { ef_search })
                .unwrap();
            let retrieved: Vec<usize> = result.neighbors.iter().map(|(id, _)| *id).collect();
            let truth = brute_force_knn(&vectors, query, 10);
            total += recall_at_k(&retrieved, &truth);
        }
        total / queries.len() as f64
    };

    let low = recall_for(10);
    let high = recall_for(150);
    assert!(
        high >= low - 1e-9,
        "recall at ef=150 ({high}) should not be worse than at ef=10 ({low})"
    );
}

#[test]
fn sa_tree_knn_search_matches_brute_force_on_small_input() {
    // §8.2 round-trip: for a small enough tree the best-first kNN search
    // should recover the exact nearest neighbors.
    let dim = 8;
    let vectors = random_vectors(200, dim, 21);
    let tree = SaTree::build(&vectors).unwrap();
    let queries = random_vectors(20, dim, 22);

    let mut total_recall = 0.0;
    for query in &queries {
        let result = tree.knn_search(query, 5).unwrap();
        let retrieved: Vec<usize> = result.neighbors.iter().map(|(id, _)| *id).collect();
        let truth = brute_force_knn(&vectors, query, 5);
        total_recall += recall_at_k(&retrieved, &truth);
    }
    let avg_recall = total_recall / queries.len() as f64;
    assert!(
        avg_recall >= 0.95,
        "expected near-exact recall on small SA-Tree, got {avg_recall}"
    );
}

#[test]
fn swng_self_query_returns_exact_match() {
    // §8.3 scenario 5: every indexed vector must be its own nearest
    // neighbor with distance 0.
    let dim = 8;
    let vectors = random_vectors(100, dim, 30);
    let index = SwngIndex::build(
        &vectors,
        SwngParams {
            fanout: 16,
            out_degree: 8,
            seed: 5,
        },
    )
    .unwrap();

    for (i, v) in vectors.iter().enumerate() {
        let result = index.greedy_knn_search(v, 3, 1).unwrap();
        assert_eq!(result.neighbors[0].0, i);
        assert!(result.neighbors[0].1.abs() < 1e-9);
    }
}

#[test]
fn swng_true_knn_search_is_exact_ground_truth() {
    let dim = 16;
    let vectors = random_vectors(500, dim, 40);
    let index = SwngIndex::build(
        &vectors,
        SwngParams {
            fanout: 16,
            out_degree: 8,
            seed: 6,
        },
    )
    .unwrap();
    let query = random_vectors(1, dim, 41).remove(0);

    let result = index.true_knn_search(&query, 10).unwrap();
    let retrieved: Vec<usize> = result.neighbors.iter().map(|(id, _)| *id).collect();
    let truth = brute_force_knn(&vectors, &query, 10);
    assert_eq!(retrieved, truth);
}

#[test]
fn builds_are_deterministic_given_a_fixed_seed() {
    // §8.2 round-trip: build with fixed RNG seed -> identical index
    // structure across two runs, observed via identical search results.
    let dim = 12;
    let vectors = random_vectors(500, dim, 50);
    let query = random_vectors(1, dim, 51).remove(0);

    let params = HnswParams {
        m: 16,
        m0: 32,
        ef_construction: 64,
        seed: 99,
    };
    let a = HnswIndex::build(&vectors, params).unwrap();
    let b = HnswIndex::build(&vectors, params).unwrap();
    let ra = a
        .knn_search(&query, 10, HnswSearchParams { ef_search: 50 })
        .unwrap();
    let rb = b
        .knn_search(&query, 10, HnswSearchParams { ef_search: 50 })
        .unwrap();
    assert_eq!(ra.neighbors, rb.neighbors);
}
