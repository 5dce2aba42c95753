//! The three ANN engines and the types they share.
//!
//! The engines do not share a common trait object — the driver dispatches
//! on [`IndexKind`] instead (see §9 "Polymorphism"). What they do share is
//! the shape of a search result and the graph-stats tuple.

pub mod hnsw;
pub mod sa_tree;
pub mod swng;

use std::time::Duration;

/// Dense node identifier, assigned in insertion order starting at 0.
pub type NodeId = usize;

/// Which engine a driver selected to build and query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Hierarchical navigable small-world multilayer graph.
    Hnsw,
    /// Spatial-approximation tree.
    SaTree,
    /// Flat small-world navigable graph.
    Swng,
}

impl std::str::FromStr for IndexKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hnsw" => Ok(Self::Hnsw),
            "sa_tree" => Ok(Self::SaTree),
            "swng" => Ok(Self::Swng),
            other => Err(crate::error::Error::InvalidParameter {
                name: "index kind",
                message: format!("unrecognized index kind `{other}` (expected hnsw|sa_tree|swng)"),
            }),
        }
    }
}

/// Outcome of a `knn_search` call: ranked neighbors plus engine counters.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// `(node_id, distance)` pairs, ascending by distance.
    pub neighbors: Vec<(NodeId, f64)>,
    /// Wall-clock time spent in the search.
    pub elapsed: Duration,
    /// Number of distinct nodes whose distance to the query was computed.
    pub nodes_visited: usize,
    /// Engine-specific hop counter (0 where not meaningful).
    pub hops: usize,
    /// Engine-specific depth counter (0 where not meaningful).
    pub depth: usize,
}

impl SearchResult {
    pub(crate) fn empty(elapsed: Duration) -> Self {
        Self {
            neighbors: Vec::new(),
            elapsed,
            nodes_visited: 0,
            hops: 0,
            depth: 0,
        }
    }
}

/// Average/max/min out-degree, reported by the SA-Tree and SWNG engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    /// Mean out-degree across internal (non-leaf) nodes.
    pub avg_degree: f64,
    /// Largest out-degree observed.
    pub max_degree: usize,
    /// Smallest out-degree observed.
    pub min_degree: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_index_kind_from_str() {
        assert_eq!(IndexKind::from_str("hnsw").unwrap(), IndexKind::Hnsw);
        assert_eq!(IndexKind::from_str("sa_tree").unwrap(), IndexKind::SaTree);
        assert_eq!(IndexKind::from_str("swng").unwrap(), IndexKind::Swng);
        assert!(IndexKind::from_str("bogus").is_err());
    }
}
