//! # vector-index-core
//!
//! In-memory approximate nearest-neighbor (ANN) indexes over dense
//! `f32` vectors under the L2 metric.
//!
//! Three independent engines are provided, each trading off construction
//! cost, memory, and recall differently:
//!
//! - [`index::hnsw::HnswIndex`] — a hierarchical navigable small-world
//!   multilayer graph. The best default for most workloads.
//! - [`index::sa_tree::SaTree`] — a spatial-approximation tree with
//!   covering-radius pruning. Immutable once built.
//! - [`index::swng::SwngIndex`] — a flat small-world graph built by
//!   incremental neighbor attachment.
//!
//! All three share the same shared best-distance traversal primitive,
//! [`queue::BoundedBestQueue`], and the same [`metric::l2_distance`] and
//! [`rng::Rng`] utilities.
//!
//! ## Quick start
//!
//! ```
//! use vector_index_core::index::hnsw::{HnswIndex, HnswParams, SearchParams};
//!
//! let vectors = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
//! let index = HnswIndex::build(&vectors, HnswParams::default()).unwrap();
//! let result = index
//!     .knn_search(&[0.1, 0.1], 1, SearchParams { ef_search: 10 })
//!     .unwrap();
//! assert_eq!(result.neighbors[0].0, 0);
//! ```
//!
//! ## Scope
//!
//! The core is single-threaded and synchronous: builds are sequential
//! inserts, and a fully-built index is safe for concurrent read-only
//! search but not for concurrent mutation. Persistence, incremental
//! deletion, and metrics other than L2 are out of scope — see
//! `DESIGN.md`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod index;
pub mod metric;
pub mod queue;
pub mod rng;

pub use error::{Error, Result};
pub use index::hnsw::HnswIndex;
pub use index::sa_tree::SaTree;
pub use index::swng::SwngIndex;
pub use index::{GraphStats, IndexKind, NodeId, SearchResult};
pub use metric::l2_distance;
pub use queue::{BoundedBestQueue, Record};
pub use rng::Rng;
