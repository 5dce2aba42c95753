//! Hierarchical Navigable Small World multilayer graph (§4.2).
//!
//! Each node owns one [`BoundedBestQueue`] per layer it participates in;
//! the queue's own capacity/eviction rule *is* the "keep the M closest
//! neighbors" step from the construction algorithm, so insertion never
//! needs a separate pruning pass.

pub mod params;

pub use params::{HnswParams, SearchParams};

use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::index::{NodeId, SearchResult};
use crate::metric::l2_distance;
use crate::queue::{BoundedBestQueue, Record};
use crate::rng::Rng;

struct HnswNode {
    embedding: Vec<f32>,
    /// `layers[l]` holds this node's neighbors on layer `l`.
    layers: Vec<BoundedBestQueue<NodeId>>,
}

/// An in-memory HNSW index over `f32` vectors under L2 distance.
///
/// Not `Sync`-unsafe: every mutable part is behind `parking_lot` locks, so
/// concurrent reads can proceed during a search, but the crate makes no
/// promise about concurrent insert + search (see §5/Non-goals).
pub struct HnswIndex {
    params: HnswParams,
    dim: usize,
    nodes: RwLock<Vec<HnswNode>>,
    entry_point: RwLock<Option<NodeId>>,
    rng: Mutex<Rng>,
}

impl HnswIndex {
    /// Creates an empty index for `dim`-dimensional vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `params` fails validation.
    pub fn new(dim: usize, params: HnswParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            dim,
            nodes: RwLock::new(Vec::new()),
            entry_point: RwLock::new(None),
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
    pub fn build(vectors: &[Vec<f32>], params: HnswParams) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Err(Error::EmptyInput);
        };
        let index = Self::new(first.len(), params)?;
        for v in vectors {
            index.insert(v)?;
        }
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

    /// Samples an insertion level: `floor(-ln(U) * mL)`, `U` drawn from
    /// `(0, 1)` so `ln(U)` is always finite.
    fn sample_level(&self) -> usize {
        let mut rng = self.rng.lock();
        let u = (1.0 - rng.uniform_f64()).max(f64::MIN_POSITIVE);
        (-u.ln() * self.params.level_mult()).floor() as usize
    }

    /// Inserts `embedding` and returns its assigned node id.
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

        let level = self.sample_level();
        let new_id;
        {
            let mut nodes = self.nodes.write();
            new_id = nodes.len();
            let mut layers = Vec::with_capacity(level + 1);
            for l in 0..=level {
                let cap = if l == 0 { self.params.m0 } else { self.params.m };
                layers.push(BoundedBestQueue::new(cap));
            }
            nodes.push(HnswNode {
                embedding: embedding.to_vec(),
                layers,
            });
        }
        trace!(node_id = new_id, level, "hnsw: assigned insertion level");

        let entry = {
            let mut ep = self.entry_point.write();
            match *ep {
                None => {
                    *ep = Some(new_id);
                    return Ok(new_id);
                }
                Some(entry) => {
                    let entry_level = self.nodes.read()[entry].layers.len() - 1;
                    if level > entry_level {
                        *ep = Some(new_id);
                    }
                    entry
                }
            }
        };

        let entry_level = {
            let nodes = self.nodes.read();
            nodes[entry].layers.len() - 1
        };
        let mut curr = entry;

        // Greedy descent (ef=1) through layers strictly above the new
        // node's top layer.
        for l in (level + 1..=entry_level).rev() {
            let nodes = self.nodes.read();
            curr = self.greedy_closest(&nodes, embedding, curr, l);
        }

        // Best-first attachment at every layer the new node participates
        // in, walking down to layer 0.
        let mut entry_points = vec![curr];
        for l in (0..=level.min(entry_level)).rev() {
            let selected: Vec<Record<NodeId>> = {
                let nodes = self.nodes.read();
                let candidates = self.search_layer_locked(
                    &nodes,
                    embedding,
                    &entry_points,
                    self.params.ef_construction,
                    l,
                );
                let cap = if l == 0 { self.params.m0 } else { self.params.m };
                candidates.records().take(cap).collect()
            };
            entry_points = selected.iter().map(|r| r.item).collect();

            let mut nodes_mut = self.nodes.write();
            for rec in &selected {
                nodes_mut[new_id].layers[l].insert(Record {
                    item: rec.item,
                    distance: rec.distance,
                });
                nodes_mut[rec.item].layers[l].insert(Record {
                    item: new_id,
                    distance: rec.distance,
                });
            }
        }
        debug!(node_id = new_id, level, "hnsw: inserted node");

        Ok(new_id)
    }

    /// Greedy single-step descent used above the new node's top layer:
    /// repeatedly moves to the neighbor closest to `query` until no
    /// neighbor improves on the current node (`ef = 1`).
    fn greedy_closest(
        &self,
        nodes: &[HnswNode],
        query: &[f32],
        start: NodeId,
        layer: usize,
    ) -> NodeId {
        let mut curr = start;
        let mut curr_dist = l2_distance(query, &nodes[curr].embedding);
        loop {
            let mut improved = false;
            for rec in nodes[curr].layers[layer].records() {
                let d = l2_distance(query, &nodes[rec.item].embedding);
                if d < curr_dist {
                    curr_dist = d;
                    curr = rec.item;
                    improved = true;
                }
            }
            if !improved {
                return curr;
            }
        }
    }

    /// Best-first search of `layer` seeded from `entry_points`, returning
    /// up to `ef` candidates ordered closest-first.
    ///
    /// Implements §4.2's `searchLayer`: a candidate frontier (closest-first)
    /// and a results set (bounded to `ef`), expanding the best unvisited
    /// candidate until its distance exceeds the current worst result.
    fn search_layer_locked(
        &self,
        nodes: &[HnswNode],
        query: &[f32],
        entry_points: &[NodeId],
        ef: usize,
        layer: usize,
    ) -> BoundedBestQueue<NodeId> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BoundedBestQueue<NodeId> = BoundedBestQueue::new(usize::MAX);
        let mut results: BoundedBestQueue<NodeId> = BoundedBestQueue::new(ef);

        for &ep in entry_points {
            if visited.insert(ep) {
                let d = l2_distance(query, &nodes[ep].embedding);
                candidates.insert(Record { item: ep, distance: d });
                results.insert(Record { item: ep, distance: d });
            }
        }

        while let Some(candidate) = candidates.pop_best() {
            if let Some(worst) = results.peek_worst() {
                if results.len() >= ef && candidate.distance > worst.distance {
                    break;
                }
            }
            for rec in nodes[candidate.item].layers[layer].records() {
                if visited.insert(rec.item) {
                    let d = l2_distance(query, &nodes[rec.item].embedding);
                    candidates.insert(Record { item: rec.item, distance: d });
                    results.insert(Record { item: rec.item, distance: d });
                }
            }
        }
        results
    }

    /// Finds the `k` approximate nearest neighbors of `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `query.len() != dim`, or
    /// [`Error::InvalidParameter`] if `search.ef_search == 0`.
    pub fn knn_search(&self, query: &[f32], k: usize, search: SearchParams) -> Result<SearchResult> {
        let started = Instant::now();
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        search.validate()?;

        let nodes = self.nodes.read();
        let Some(entry) = *self.entry_point.read() else {
            return Ok(SearchResult::empty(started.elapsed()));
        };
        if nodes.is_empty() {
            return Ok(SearchResult::empty(started.elapsed()));
        }

        let top_layer = nodes[entry].layers.len() - 1;
        let mut curr = entry;
        let mut hops = 0usize;
        for l in (1..=top_layer).rev() {
            let next = self.greedy_closest(&nodes, query, curr, l);
            if next != curr {
                hops += 1;
            }
            curr = next;
        }

        let ef = search.ef_search.max(k);
        let candidates = self.search_layer_locked(&nodes, query, &[curr], ef, 0);
        let nodes_visited = candidates.len();

        let neighbors: Vec<(NodeId, f64)> = candidates
            .records()
            .take(k)
            .map(|r| (r.item, r.distance))
            .collect();

        Ok(SearchResult {
            neighbors,
            elapsed: started.elapsed(),
            nodes_visited,
            hops,
            depth: top_layer,
        })
    }
}
