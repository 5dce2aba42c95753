//! Flat small-world navigable graph (§4.4).
//!
//! Unlike HNSW's layered queues, a SWNG node keeps a single unbounded set of
//! undirected neighbors (§3.6). The graph is built by attaching each new
//! node to the `w` nearest nodes found by a self-kNN search over the
//! partial graph built so far.

pub mod params;

pub use params::SwngParams;

use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::index::{GraphStats, NodeId};
use crate::metric::l2_distance;
use crate::queue::{BoundedBestQueue, Record};
use crate::rng::Rng;

struct SwngNode {
    embedding: Vec<f32>,
    neighbors: FxHashSet<NodeId>,
}

/// Outcome of a SWNG search: ranked neighbors plus the engine's own
/// counters (§6.2's `hops`/`depth`, named here `avgHops`/`maxDepth`).
#[derive(Debug, Clone)]
pub struct SwngResult {
    /// `(node_id, distance)` pairs, ascending by distance.
    pub neighbors: Vec<(NodeId, f64)>,
    /// Wall-clock time spent in the search.
    pub elapsed: Duration,
    /// Number of distinct nodes whose distance to the query was computed.
    pub nodes_visited: usize,
    /// Average number of edge expansions per restart (0 where not
    /// meaningful, e.g. beam variants).
    pub hops: usize,
    /// Largest number of expansion rounds seen across restarts/beam rounds.
    pub max_depth: usize,
}

/// An in-memory flat small-world navigable graph over `f32` vectors under
/// L2 distance.
pub struct SwngIndex {
    params: SwngParams,
    dim: usize,
    nodes: RwLock<Vec<SwngNode>>,
    rng: Mutex<Rng>,
}

impl SwngIndex {
    /// Creates an empty index for `dim`-dimensional vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `params` fails validation.
    pub fn new(dim: usize, params: SwngParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            dim,
            nodes: RwLock::new(Vec::new()),
            rng: Mutex::new(Rng::seeded(params.seed)),
        })
    }

    /// Builds an index from `vectors` by inserting them in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if `vectors` is empty, or
    /// [`Error::DimensionMismatch`] if any vector's length differs from the
    /// first.
    pub fn build(vectors: &[Vec<f32>], params: SwngParams) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Err(Error::EmptyInput);
        };
        let index = Self::new(first.len(), params)?;
        for v in vectors {
            index.insert(v)?;
        }
        debug!(nodes = index.len(), "swng: built");
        Ok(index)
    }

    /// Number of vectors currently indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the index holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Inserts `embedding` and returns its assigned node id.
    ///
    /// While fewer than `out_degree` nodes exist, the new node connects to
    /// every existing node (bootstrap). Afterwards it connects to the `w`
    /// nearest nodes found by [`Self::greedy_knn_search`] over the partial
    /// graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `embedding.len() != dim`.
    pub fn insert(&self, embedding: &[f32]) -> Result<NodeId> {
        if embedding.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: embedding.len(),
            });
        }

        let w = self.params.out_degree;
        let existing = self.nodes.read().len();

        if existing < w {
            let mut nodes = self.nodes.write();
            let new_id = nodes.len();
            let mut neighbors = FxHashSet::default();
            for other in 0..new_id {
                nodes[other].neighbors.insert(new_id);
                neighbors.insert(other);
            }
            nodes.push(SwngNode {
                embedding: embedding.to_vec(),
                neighbors,
            });
            trace!(node_id = new_id, "swng: bootstrap-connected to all prior nodes");
            return Ok(new_id);
        }

        let attach = self.greedy_knn_search(embedding, self.params.fanout, w)?;
        let mut nodes = self.nodes.write();
        let new_id = nodes.len();
        let mut neighbors = FxHashSet::default();
        for &(other, _) in &attach.neighbors {
            nodes[other].neighbors.insert(new_id);
            neighbors.insert(other);
        }
        nodes.push(SwngNode {
            embedding: embedding.to_vec(),
            neighbors,
        });
        trace!(node_id = new_id, degree = attach.neighbors.len(), "swng: inserted node");
        Ok(new_id)
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        Ok(())
    }

    /// Picks a uniform random node index, ignoring whether it has already
    /// been visited by a prior restart — a repeat restart is harmless,
    /// just wasted work, so it isn't rejected.
    fn random_start(&self, n: usize) -> NodeId {
        self.rng.lock().uniform_usize(0, n - 1)
    }

    /// Multi-start best-first search over the current graph (§4.4's
    /// `greedyKnnSearch`). Each of the `m` restarts expands best-first from
    /// a random start until its local top-`k` no longer improves, then
    /// merges into the shared result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn greedy_knn_search(&self, query: &[f32], m: usize, k: usize) -> Result<SwngResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let nodes = self.nodes.read();
        if nodes.is_empty() {
            return Ok(SwngResult {
                neighbors: Vec::new(),
                elapsed: started.elapsed(),
                nodes_visited: 0,
                hops: 0,
                max_depth: 0,
            });
        }

        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut result: BoundedBestQueue<NodeId> = BoundedBestQueue::new(k);
        let mut nodes_visited = 0usize;
        let mut total_hops = 0usize;
        let mut max_depth = 0usize;

        for _ in 0..m {
            if visited.len() >= nodes.len() {
                break;
            }
            let start = self.random_start(nodes.len());

            let mut tmp_result: BoundedBestQueue<NodeId> = BoundedBestQueue::new(k);
            let mut candidates: BoundedBestQueue<NodeId> = BoundedBestQueue::new(usize::MAX);
            let d = l2_distance(query, &nodes[start].embedding);
            candidates.insert(Record { item: start, distance: d });
            nodes_visited += 1;

            let mut depth = 0usize;
            while let Some(closest) = candidates.pop_best() {
                if tmp_result.len() >= k {
                    if let Some(worst) = tmp_result.peek_worst() {
                        if worst.distance < closest.distance {
                            break;
                        }
                    }
                }
                let mut expanded = false;
                for &neighbor in &nodes[closest.item].neighbors {
                    if !visited.insert(neighbor) {
                        continue;
                    }
                    let d = l2_distance(query, &nodes[neighbor].embedding);
                    candidates.insert(Record { item: neighbor, distance: d });
                    tmp_result.insert(Record { item: neighbor, distance: d });
                    nodes_visited += 1;
                    total_hops += 1;
                    expanded = true;
                }
                if expanded {
                    depth += 1;
                }
            }
            max_depth = max_depth.max(depth);

            for record in tmp_result.records() {
                result.insert(record);
            }
        }

        let neighbors: Vec<(NodeId, f64)> =
            result.records().map(|r| (r.item, r.distance)).collect();
        Ok(SwngResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            hops: if m == 0 { 0 } else { total_hops / m },
            max_depth,
        })
    }

    /// Beam search whose own beam (truncated to `k`) is the reported
    /// result, analogous to SA-Tree's `beamKnnSearch`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn beam_knn_search(&self, query: &[f32], b: usize, k: usize) -> Result<SwngResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let nodes = self.nodes.read();
        let mut nodes_visited = 0usize;
        let mut max_depth = 0usize;
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(b);

        for _ in 0..b {
            if visited.len() >= nodes.len() {
                break;
            }
            let start = self.random_start(nodes.len());
            if !visited.insert(start) {
                continue;
            }
            let d = l2_distance(query, &nodes[start].embedding);
            beam.insert(Record { item: start, distance: d });
            nodes_visited += 1;
        }

        loop {
            let closest_before = beam.peek_worst().map_or(f64::INFINITY, |r| r.distance);
            let mut new_beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(b);
            let mut expanded = false;
            for record in beam.records().collect::<Vec<_>>() {
                for &neighbor in &nodes[record.item].neighbors {
                    if !visited.insert(neighbor) {
                        continue;
                    }
                    let d = l2_distance(query, &nodes[neighbor].embedding);
                    nodes_visited += 1;
                    new_beam.insert(Record { item: neighbor, distance: d });
                    expanded = true;
                }
            }
            if expanded {
                max_depth += 1;
            }
            for record in new_beam.records() {
                beam.insert(record);
            }
            let closest_after = beam.peek_worst().map_or(f64::INFINITY, |r| r.distance);
            if closest_after >= closest_before {
                break;
            }
        }

        let neighbors: Vec<(NodeId, f64)> =
            beam.records().take(k).map(|r| (r.item, r.distance)).collect();
        Ok(SwngResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            hops: 0,
            max_depth,
        })
    }

    /// Beam search that grows an independent `result` set (capacity `k`)
    /// alongside the beam, analogous to SA-Tree's `beamKnnSearch2`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn beam_knn_search2(&self, query: &[f32], b: usize, k: usize) -> Result<SwngResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let nodes = self.nodes.read();
        let mut nodes_visited = 0usize;
        let mut max_depth = 0usize;
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(b);
        let mut result: BoundedBestQueue<NodeId> = BoundedBestQueue::new(k);

        for _ in 0..b {
            if visited.len() >= nodes.len() {
                break;
            }
            let start = self.random_start(nodes.len());
            if !visited.insert(start) {
                continue;
            }
            let d = l2_distance(query, &nodes[start].embedding);
            beam.insert(Record { item: start, distance: d });
            result.insert(Record { item: start, distance: d });
            nodes_visited += 1;
        }

        loop {
            let closest_before = if result.len() >= k {
                result.peek_worst().map_or(f64::INFINITY, |r| r.distance)
            } else {
                f64::INFINITY
            };

            let mut new_beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(b);
            let mut expanded = false;
            for record in beam.records().collect::<Vec<_>>() {
                for &neighbor in &nodes[record.item].neighbors {
                    if !visited.insert(neighbor) {
                        continue;
                    }
                    let d = l2_distance(query, &nodes[neighbor].embedding);
                    nodes_visited += 1;
                    new_beam.insert(Record { item: neighbor, distance: d });
                    result.insert(Record { item: neighbor, distance: d });
                    expanded = true;
                }
            }
            if expanded {
                max_depth += 1;
            }
            for record in new_beam.records() {
                beam.insert(record);
            }

            let closest_after = if result.len() >= k {
                result.peek_worst().map_or(f64::INFINITY, |r| r.distance)
            } else {
                f64::INFINITY
            };
            if closest_after >= closest_before {
                break;
            }
        }

        let neighbors: Vec<(NodeId, f64)> =
            result.records().map(|r| (r.item, r.distance)).collect();
        Ok(SwngResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            hops: 0,
            max_depth,
        })
    }

    /// Combines beam seeding with a single best-first expansion pass: `b`
    /// random starts feed both a candidate queue and the beam, and
    /// candidates are drained until the beam's worst member beats the next
    /// candidate (§4.4's `someOtherKnnSearch`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn some_other_knn_search(&self, query: &[f32], b: usize, k: usize) -> Result<SwngResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let nodes = self.nodes.read();
        let mut nodes_visited = 0usize;
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(b);
        let mut candidates: BoundedBestQueue<NodeId> = BoundedBestQueue::new(usize::MAX);

        for _ in 0..b {
            if visited.len() >= nodes.len() {
                break;
            }
            let start = self.random_start(nodes.len());
            if !visited.insert(start) {
                continue;
            }
            let d = l2_distance(query, &nodes[start].embedding);
            beam.insert(Record { item: start, distance: d });
            candidates.insert(Record { item: start, distance: d });
            nodes_visited += 1;
        }

        while let Some(closest) = candidates.pop_best() {
            if beam.len() >= b {
                if let Some(worst) = beam.peek_worst() {
                    if worst.distance < closest.distance {
                        break;
                    }
                }
            }
            for &neighbor in &nodes[closest.item].neighbors {
                if !visited.insert(neighbor) {
                    continue;
                }
                let d = l2_distance(query, &nodes[neighbor].embedding);
                nodes_visited += 1;
                candidates.insert(Record { item: neighbor, distance: d });
                beam.insert(Record { item: neighbor, distance: d });
            }
        }

        let neighbors: Vec<(NodeId, f64)> =
            beam.records().take(k).map(|r| (r.item, r.distance)).collect();
        Ok(SwngResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            hops: 0,
            max_depth: 0,
        })
    }

    /// Brute-force scan used as a ground-truth oracle for recall
    /// measurement (§4.4's `trueKnnSearch`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn true_knn_search(&self, query: &[f32], k: usize) -> Result<SwngResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let nodes = self.nodes.read();
        let mut result: BoundedBestQueue<NodeId> = BoundedBestQueue::new(k);
        for (id, node) in nodes.iter().enumerate() {
            let d = l2_distance(query, &node.embedding);
            result.insert(Record { item: id, distance: d });
        }
        let neighbors: Vec<(NodeId, f64)> =
            result.records().map(|r| (r.item, r.distance)).collect();
        Ok(SwngResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited: nodes.len(),
            hops: 0,
            max_depth: 0,
        })
    }

    /// Reports average/max/min out-degree across all nodes.
    #[must_use]
    pub fn graph_stats(&self) -> GraphStats {
        let nodes = self.nodes.read();
        if nodes.is_empty() {
            return GraphStats {
                avg_degree: 0.0,
                max_degree: 0,
                min_degree: 0,
            };
        }
        let mut sum = 0usize;
        let mut max_degree = 0usize;
        let mut min_degree = usize::MAX;
        for node in nodes.iter() {
            let degree = node.neighbors.len();
            sum += degree;
            max_degree = max_degree.max(degree);
            min_degree = min_degree.min(degree);
        }
        GraphStats {
            avg_degree: sum as f64 / nodes.len() as f64,
            max_degree,
            min_degree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> SwngParams {
        SwngParams {
            fanout: 16,
            out_degree: 8,
            seed,
        }
    }

    fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
        let mut rng = Rng::seeded(seed);
        (0..n)
            .map(|_| (0..dim).map(|_| rng.uniform_f64() as f32).collect())
            .collect()
    }

    #[test]
    fn test_build_rejects_empty_input() {
        let err = SwngIndex::build(&[], params(0)).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_bootstrap_connects_all_nodes() {
        // out_degree = 8, but only 4 vectors inserted: every node connects
        // to every other node per the bootstrap rule.
        let vectors: Vec<Vec<f32>> = (0..4).map(|i| vec![i as f32]).collect();
        let index = SwngIndex::build(&vectors, params(0)).unwrap();
        let stats = index.graph_stats();
        assert_eq!(stats.min_degree, 3);
        assert_eq!(stats.max_degree, 3);
    }

    #[test]
    fn test_self_query_returns_zero_distance() {
        let vectors = random_vectors(100, 8, 42);
        let index = SwngIndex::build(&vectors, SwngParams { fanout: 16, out_degree: 8, seed: 7 }).unwrap();
        for (i, v) in vectors.iter().enumerate() {
            let result = index.greedy_knn_search(v, 3, 1).unwrap();
            assert_eq!(result.neighbors[0].0, i);
            assert!(result.neighbors[0].1.abs() < 1e-9);
        }
    }

    #[test]
    fn test_true_knn_search_is_exact() {
        let vectors: Vec<Vec<f32>> = (0..50).map(|i| vec![i as f32]).collect();
        let index = SwngIndex::build(&vectors, params(3)).unwrap();
        let result = index.true_knn_search(&[25.0], 3).unwrap();
        let ids: std::collections::HashSet<usize> =
            result.neighbors.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, [24usize, 25, 26].into_iter().collect());
        assert_eq!(result.neighbors.len(), 3);
        for pair in result.neighbors.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn test_dimension_mismatch_on_insert() {
        let index = SwngIndex::new(3, params(0)).unwrap();
        index.insert(&[1.0, 2.0, 3.0]).unwrap();
        let err = index.insert(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn test_dimension_mismatch_on_search() {
        let index = SwngIndex::build(&[vec![1.0, 2.0]], params(0)).unwrap();
        let err = index.greedy_knn_search(&[1.0], 2, 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_beam_variants_return_at_most_k() {
        let vectors = random_vectors(60, 4, 11);
        let index = SwngIndex::build(&vectors, params(5)).unwrap();
        let q = vec![0.3, 0.3, 0.3, 0.3];
        let beam = index.beam_knn_search(&q, 8, 5).unwrap();
        assert!(beam.neighbors.len() <= 5);
        let beam2 = index.beam_knn_search2(&q, 8, 5).unwrap();
        assert!(beam2.neighbors.len() <= 5);
        let other = index.some_other_knn_search(&q, 8, 5).unwrap();
        assert!(other.neighbors.len() <= 5);
    }

    #[test]
    fn test_graph_stats_on_built_index() {
        let vectors = random_vectors(40, 6, 99);
        let index = SwngIndex::build(&vectors, params(2)).unwrap();
        let stats = index.graph_stats();
        assert!(stats.max_degree >= stats.min_degree);
        assert!(stats.avg_degree > 0.0);
    }
}
