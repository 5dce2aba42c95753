//! Spatial-approximation tree (§4.3).
//!
//! Every non-root node is owned by exactly one parent; the tree is stored
//! as a flat arena (`Vec<SaTreeNode>`) addressed by [`NodeId`], with each
//! node holding its children's ids. `root` is always the last vector in
//! the build input (see DESIGN.md, Open Question 3).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::index::{GraphStats, NodeId};
use crate::metric::l2_distance;
use crate::queue::{BoundedBestQueue, Record};

struct SaTreeNode {
    embedding: Vec<f32>,
    children: Vec<NodeId>,
    /// Covering radius: max distance from this node to any descendant.
    radius: f64,
}

/// Outcome of a range or kNN search: unordered-by-insertion result set
/// plus engine counters, matching §4.3's `ResultObject`.
#[derive(Debug, Clone)]
pub struct SaTreeResult {
    /// `(node_id, distance)` pairs, ascending by distance.
    pub neighbors: Vec<(NodeId, f64)>,
    /// Wall-clock time spent in the search.
    pub elapsed: Duration,
    /// Number of distinct nodes whose distance to the query was computed.
    pub nodes_visited: usize,
    /// Number of beam-expansion rounds performed (0 for non-beam searches).
    pub max_depth: usize,
}

/// A candidate in the best-first kNN frontier, ordered by ascending
/// `weight` (a min-heap via `Reverse`-style inverted `Ord`).
#[derive(Debug, Clone, Copy)]
struct QueueItem {
    node: NodeId,
    weight: f64,
    digression: f64,
    distance: f64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}
impl Eq for QueueItem {}
impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the smallest weight pops first.
        other.weight.total_cmp(&self.weight)
    }
}

/// An in-memory spatial-approximation tree over `f32` vectors under L2
/// distance.
pub struct SaTree {
    nodes: Vec<SaTreeNode>,
    root: NodeId,
    dim: usize,
}

impl SaTree {
    /// Builds a tree from `vectors`. The last vector becomes the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if `vectors` is empty, or
    /// [`Error::DimensionMismatch`] if vectors have inconsistent lengths.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Err(Error::EmptyInput);
        };
        let dim = first.len();
        let mut nodes: Vec<SaTreeNode> = Vec::with_capacity(vectors.len());
        for v in vectors {
            if v.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                });
            }
            nodes.push(SaTreeNode {
                embedding: v.clone(),
                children: Vec::new(),
                radius: 0.0,
            });
        }

        let root = nodes.len() - 1;
        let available: Vec<NodeId> = (0..root).collect();
        let mut tree = Self { nodes, root, dim };
        tree.build_subtree(root, available);
        debug!(nodes = tree.nodes.len(), "sa_tree: built");
        Ok(tree)
    }

    /// Recursively partitions `available` into children of `root` and
    /// descendants of those children, per §4.3's admission test: a node is
    /// admitted as a direct child iff it is not closer to any
    /// already-admitted sibling than it is to `root`.
    fn build_subtree(&mut self, root: NodeId, mut available: Vec<NodeId>) {
        self.nodes[root].children.clear();
        self.nodes[root].radius = 0.0;

        let root_embedding = self.nodes[root].embedding.clone();
        available.sort_by(|&a, &b| {
            let da = l2_distance(&self.nodes[a].embedding, &root_embedding);
            let db = l2_distance(&self.nodes[b].embedding, &root_embedding);
            da.total_cmp(&db)
        });

        let mut children: Vec<NodeId> = Vec::new();
        let mut non_children: Vec<NodeId> = Vec::new();
        let mut radius = 0.0f64;

        for candidate in available {
            let dist = l2_distance(&self.nodes[candidate].embedding, &root_embedding);
            radius = radius.max(dist);
            let admitted = children.iter().all(|&child| {
                let child_dist =
                    l2_distance(&self.nodes[candidate].embedding, &self.nodes[child].embedding);
                child_dist > dist
            });
            if admitted {
                children.push(candidate);
            } else {
                non_children.push(candidate);
            }
        }
        self.nodes[root].radius = radius;
        self.nodes[root].children = children.clone();

        let mut buckets: Vec<Vec<NodeId>> = vec![Vec::new(); children.len()];
        for node in non_children {
            let mut best_idx = 0;
            let mut best_dist = f64::INFINITY;
            for (idx, &child) in children.iter().enumerate() {
                let d = l2_distance(&self.nodes[node].embedding, &self.nodes[child].embedding);
                if d < best_dist {
                    best_dist = d;
                    best_idx = idx;
                }
            }
            buckets[best_idx].push(node);
        }

        for (child, bucket) in children.into_iter().zip(buckets.into_iter()) {
            self.build_subtree(child, bucket);
        }
    }

    /// Number of vectors in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
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

    /// Finds every vector within `r` of `query`.
    ///
    /// Prunes by covering radius (`distance <= node.radius + r`) and by a
    /// digression bound (`digression <= 2r`): the digression of a node is
    /// the largest `d(q, node) - d(q, ancestor)` seen along the path from
    /// the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn range_search(&self, query: &[f32], r: f64) -> Result<SaTreeResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let mut nodes_visited = 1usize;
        let mut results = Vec::new();
        let root_dist = l2_distance(query, &self.nodes[self.root].embedding);
        self.range_search_node(self.root, query, root_dist, r, 0.0, &mut results, &mut nodes_visited);
        results.sort_by(|a: &(NodeId, f64), b| a.1.total_cmp(&b.1));
        Ok(SaTreeResult {
            neighbors: results,
            elapsed: started.elapsed(),
            nodes_visited,
            max_depth: 0,
        })
    }

    fn range_search_node(
        &self,
        node: NodeId,
        query: &[f32],
        distance: f64,
        r: f64,
        digression: f64,
        results: &mut Vec<(NodeId, f64)>,
        nodes_visited: &mut usize,
    ) {
        if digression > 2.0 * r || distance > self.nodes[node].radius + r {
            return;
        }
        if distance <= r {
            results.push((node, distance));
        }

        let mut child_distances = Vec::with_capacity(self.nodes[node].children.len());
        let mut min_dist = distance;
        for &child in &self.nodes[node].children {
            let d = l2_distance(query, &self.nodes[child].embedding);
            *nodes_visited += 1;
            min_dist = min_dist.min(d);
            child_distances.push(d);
        }

        for (idx, &child) in self.nodes[node].children.iter().enumerate() {
            let child_distance = child_distances[idx];
            if child_distance <= min_dist + 2.0 * r {
                self.range_search_node(
                    child,
                    query,
                    child_distance,
                    r,
                    digression.max(child_distance - distance),
                    results,
                    nodes_visited,
                );
                return;
            }
        }
    }

    /// Finds the `k` nearest neighbors of `query` via best-first traversal.
    ///
    /// The frontier is ordered by an admissible lower-bound weight; a
    /// candidate popped with `weight > rad` (the current k-th best
    /// distance) proves no unvisited node can improve the result, so the
    /// search stops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`, or
    /// [`Error::InvalidParameter`] if `k == 0`.
    pub fn knn_search(&self, query: &[f32], k: usize) -> Result<SaTreeResult> {
        let started = Instant::now();
        self.check_query(query)?;
        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be >= 1".to_string(),
            });
        }

        let root_dist = l2_distance(query, &self.nodes[self.root].embedding);
        let mut nodes_visited = 1usize;
        let mut queue = BinaryHeap::new();
        queue.push(QueueItem {
            node: self.root,
            weight: (root_dist - self.nodes[self.root].radius).max(0.0),
            digression: 0.0,
            distance: root_dist,
        });

        let mut results: BoundedBestQueue<NodeId> = BoundedBestQueue::new(k);
        let mut rad = f64::INFINITY;

        while let Some(element) = queue.pop() {
            if element.weight > rad {
                break;
            }
            results.insert(Record {
                item: element.node,
                distance: element.distance,
            });
            if results.len() == k {
                rad = results.peek_worst().expect("just inserted").distance;
            }

            let mut closest_node = element.node;
            let mut closest_dist = element.distance;
            let mut child_distances = Vec::with_capacity(self.nodes[element.node].children.len());
            for &child in &self.nodes[element.node].children {
                let d = l2_distance(query, &self.nodes[child].embedding);
                nodes_visited += 1;
                child_distances.push(d);
                if d < closest_dist {
                    closest_dist = d;
                    closest_node = child;
                }
            }
            let _ = closest_node;

            for (idx, &child) in self.nodes[element.node].children.iter().enumerate() {
                let child_distance = child_distances[idx];
                let dig = (element.digression + (child_distance - element.distance)).max(0.0);
                let weight = element
                    .weight
                    .max(dig.max((child_distance - closest_dist) / 2.0));
                queue.push(QueueItem {
                    node: child,
                    weight: weight.max(child_distance - self.nodes[child].radius),
                    digression: dig,
                    distance: child_distance,
                });
            }
        }

        let mut neighbors: Vec<(NodeId, f64)> =
            results.records().map(|r| (r.item, r.distance)).collect();
        neighbors.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(SaTreeResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            max_depth: 0,
        })
    }

    /// Beam search that keeps the beam itself as the growing result set.
    ///
    /// At each round the current beam's children become the next beam
    /// (capped at `b`), and every newly seen child also feeds `result`
    /// (capped at `k`). Stops once a round fails to improve the worst
    /// kept result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn beam_knn_search2(&self, query: &[f32], beam_width: usize, k: usize) -> Result<SaTreeResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let mut nodes_visited = 0usize;
        let mut max_depth = 0usize;
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();

        let root_dist = l2_distance(query, &self.nodes[self.root].embedding);
        let mut beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(beam_width);
        let mut result: BoundedBestQueue<NodeId> = BoundedBestQueue::new(k);
        beam.insert(Record { item: self.root, distance: root_dist });
        result.insert(Record { item: self.root, distance: root_dist });
        visited.insert(self.root);

        loop {
            let closest_before = if result.len() >= k {
                result.peek_worst().map(|r| r.distance).unwrap_or(f64::INFINITY)
            } else {
                f64::INFINITY
            };

            let mut new_beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(beam_width);
            let mut expanded = false;
            for record in beam.records().collect::<Vec<_>>() {
                for &child in &self.nodes[record.item].children {
                    if !visited.insert(child) {
                        continue;
                    }
                    let d = l2_distance(query, &self.nodes[child].embedding);
                    nodes_visited += 1;
                    new_beam.insert(Record { item: child, distance: d });
                    result.insert(Record { item: child, distance: d });
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
                result.peek_worst().map(|r| r.distance).unwrap_or(f64::INFINITY)
            } else {
                f64::INFINITY
            };
            if closest_after >= closest_before {
                break;
            }
        }

        let neighbors: Vec<(NodeId, f64)> =
            result.records().map(|r| (r.item, r.distance)).collect();
        Ok(SaTreeResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            max_depth,
        })
    }

    /// Beam search that reports the beam itself (truncated to `k`) as the
    /// result, rather than an independently-grown result set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn beam_knn_search(&self, query: &[f32], beam_width: usize, k: usize) -> Result<SaTreeResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let mut nodes_visited = 0usize;
        let mut max_depth = 0usize;
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();

        let root_dist = l2_distance(query, &self.nodes[self.root].embedding);
        let mut beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(beam_width);
        beam.insert(Record { item: self.root, distance: root_dist });
        visited.insert(self.root);

        loop {
            let closest_before = if beam.len() >= beam_width {
                beam.peek_worst().map(|r| r.distance).unwrap_or(f64::INFINITY)
            } else {
                f64::INFINITY
            };

            let mut new_beam: BoundedBestQueue<NodeId> = BoundedBestQueue::new(beam_width);
            let mut expanded = false;
            for record in beam.records().collect::<Vec<_>>() {
                for &child in &self.nodes[record.item].children {
                    if !visited.insert(child) {
                        continue;
                    }
                    let d = l2_distance(query, &self.nodes[child].embedding);
                    nodes_visited += 1;
                    new_beam.insert(Record { item: child, distance: d });
                    expanded = true;
                }
            }
            if expanded {
                max_depth += 1;
            }
            for record in new_beam.records() {
                beam.insert(record);
            }

            let closest_after = if beam.len() >= beam_width {
                beam.peek_worst().map(|r| r.distance).unwrap_or(f64::INFINITY)
            } else {
                f64::INFINITY
            };
            if closest_after >= closest_before {
                break;
            }
        }

        let neighbors: Vec<(NodeId, f64)> =
            beam.records().take(k).map(|r| (r.item, r.distance)).collect();
        Ok(SaTreeResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            max_depth,
        })
    }

    /// Runs `m` independent best-first restarts, each seeded with the
    /// previous round's top-`b` results marked visited, accumulating into
    /// one shared result set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`.
    pub fn greedy_knn_search(
        &self,
        query: &[f32],
        restarts: usize,
        beam_width: usize,
        k: usize,
    ) -> Result<SaTreeResult> {
        let started = Instant::now();
        self.check_query(query)?;
        let mut nodes_visited = 0usize;
        let mut result: BoundedBestQueue<NodeId> = BoundedBestQueue::new(usize::MAX);

        for _ in 0..restarts {
            let mut tmp_result: BoundedBestQueue<NodeId> = BoundedBestQueue::new(beam_width);
            let mut visited: FxHashSet<NodeId> = FxHashSet::default();
            for record in result.records().take(beam_width) {
                visited.insert(record.item);
            }

            let root_dist = l2_distance(query, &self.nodes[self.root].embedding);
            let mut candidates: BoundedBestQueue<NodeId> = BoundedBestQueue::new(usize::MAX);
            candidates.insert(Record { item: self.root, distance: root_dist });
            nodes_visited += 1;

            while let Some(closest) = candidates.pop_best() {
                if tmp_result.len() >= beam_width {
                    if let Some(worst) = tmp_result.peek_worst() {
                        if worst.distance < closest.distance {
                            break;
                        }
                    }
                }
                for &child in &self.nodes[closest.item].children {
                    if !visited.insert(child) {
                        continue;
                    }
                    let d = l2_distance(query, &self.nodes[child].embedding);
                    candidates.insert(Record { item: child, distance: d });
                    tmp_result.insert(Record { item: child, distance: d });
                    nodes_visited += 1;
                }
            }

            for record in tmp_result.records().take(beam_width) {
                result.insert(record);
            }
        }

        let neighbors: Vec<(NodeId, f64)> =
            result.records().take(k).map(|r| (r.item, r.distance)).collect();
        Ok(SaTreeResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            max_depth: 0,
        })
    }

    /// Reports average/max/min child-count over internal (non-leaf) nodes.
    #[must_use]
    pub fn graph_stats(&self) -> GraphStats {
        let mut queue = VecDeque::new();
        queue.push_back(self.root);
        let mut sum_degree = 0usize;
        let mut max_degree = 0usize;
        let mut min_degree = usize::MAX;
        let mut count = 0usize;

        while let Some(node) = queue.pop_front() {
            let degree = self.nodes[node].children.len();
            if degree == 0 {
                continue;
            }
            sum_degree += degree;
            max_degree = max_degree.max(degree);
            min_degree = min_degree.min(degree);
            count += 1;
            for &child in &self.nodes[node].children {
                queue.push_back(child);
            }
        }

        GraphStats {
            avg_degree: if count == 0 { 0.0 } else { sum_degree as f64 / count as f64 },
            max_degree,
            min_degree: if min_degree == usize::MAX { 0 } else { min_degree },
        }
    }
}
