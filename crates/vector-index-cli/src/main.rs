//! Benchmark driver for `vector-index-core` (§6.3).
//!
//! Loads a dataset directory containing `base.fvecs`, `query.fvecs`, and
//! `groundtruth.ivecs`, builds one of the three engines over the base set,
//! and reports build/search timings and recall against the supplied
//! ground truth. This binary owns no algorithmic logic — only option
//! parsing, file I/O, timing, and recall computation — the external
//! collaborators named in §1.

mod error;
mod fvecs;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Instant;

use clap::Parser;
use tracing::info;

use vector_index_core::index::hnsw::{HnswIndex, HnswParams, SearchParams as HnswSearchParams};
use vector_index_core::index::sa_tree::SaTree;
use vector_index_core::index::swng::{SwngIndex, SwngParams};
use vector_index_core::IndexKind;

use error::{CliError, CliResult};

/// Benchmark driver: build one ANN engine over a dataset and report
/// recall/timings against a ground-truth file.
#[derive(Parser, Debug)]
#[command(name = "vector-index", about = "ANN index benchmark driver", version)]
struct Cli {
    /// Dataset directory containing base.fvecs, query.fvecs, groundtruth.ivecs.
    #[arg(short = 'f', long = "dataset")]
    dataset: PathBuf,

    /// Number of nearest neighbors to retrieve per query.
    #[arg(short = 'k', long)]
    k: usize,

    /// Index kind: hnsw | sa_tree | swng.
    #[arg(short = 't', long = "type")]
    index_type: String,

    /// HNSW: candidate pool size during construction.
    #[arg(long = "efConstruction", default_value_t = 100)]
    ef_construction: usize,

    /// HNSW: candidate pool size during search.
    #[arg(long = "efSearch", default_value_t = 100)]
    ef_search: usize,

    /// HNSW: max connections per node on layers >= 1. SWNG reuses this as
    /// its search fanout `f` when `-t swng` is selected.
    #[arg(short = 'm', long, default_value_t = 16)]
    m: usize,

    /// HNSW: max connections per node on layer 0. SWNG reuses this as its
    /// target out-degree `w` when `-t swng` is selected.
    #[arg(long = "m0", default_value_t = 32)]
    m0: usize,

    /// RNG seed for reproducible builds.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of indexing threads. Accepted for interface parity with the
    /// original benchmark driver; the core is single-threaded (§5), so
    /// this only validates as a positive integer and labels output.
    #[arg(long = "index-threads", default_value_t = 1)]
    index_threads: usize,

    /// Comma-separated search thread counts to report timings for, e.g.
    /// `1,2,4`. Same single-threaded-core caveat as `--index-threads`.
    #[arg(long = "search-threads", default_value = "1")]
    search_threads: String,
}

fn parse_search_threads(raw: &str) -> CliResult<Vec<usize>> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| CliError::InvalidThreadCount {
                    flag: "search-threads",
                    value: part.to_string(),
                })
        })
        .collect()
}

/// Fraction of `truth`'s first `k` ids present in `retrieved`'s first `k`.
fn recall_at_k(retrieved: &[usize], truth: &[i32], k: usize) -> f64 {
    let k = k.min(retrieved.len()).min(truth.len());
    if k == 0 {
        return 0.0;
    }
    let truth_set: std::collections::HashSet<i32> = truth[..k].iter().copied().collect();
    let hits = retrieved[..k]
        .iter()
        .filter(|&&id| truth_set.contains(&(id as i32)))
        .count();
    hits as f64 / k as f64
}

enum Engine {
    Hnsw(HnswIndex),
    SaTree(SaTree),
    Swng(SwngIndex),
}

impl Engine {
    fn build(kind: IndexKind, vectors: &[Vec<f32>], cli: &Cli) -> CliResult<Self> {
        match kind {
            IndexKind::Hnsw => Ok(Self::Hnsw(HnswIndex::build(
                vectors,
                HnswParams {
                    m: cli.m,
                    m0: cli.m0,
                    ef_construction: cli.ef_construction,
                    seed: cli.seed,
                },
            )?)),
            IndexKind::SaTree => Ok(Self::SaTree(SaTree::build(vectors)?)),
            IndexKind::Swng => Ok(Self::Swng(SwngIndex::build(
                vectors,
                SwngParams {
                    fanout: cli.m,
                    out_degree: cli.m0,
                    seed: cli.seed,
                },
            )?)),
        }
    }

    fn search(&self, query: &[f32], k: usize, ef_search: usize) -> CliResult<Vec<usize>> {
        let ids = match self {
            Self::Hnsw(index) => index
                .knn_search(query, k, HnswSearchParams { ef_search })?
                .neighbors,
            Self::SaTree(tree) => tree.knn_search(query, k)?.neighbors,
            Self::Swng(index) => index.greedy_knn_search(query, 3, k)?.neighbors,
        };
        Ok(ids.into_iter().map(|(id, _)| id).collect())
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn run(cli: &Cli) -> CliResult<()> {
    let kind =
        IndexKind::from_str(&cli.index_type).map_err(|_| CliError::UnknownIndexKind(cli.index_type.clone()))?;

    if cli.index_threads == 0 {
        return Err(CliError::InvalidThreadCount {
            flag: "index-threads",
            value: cli.index_threads.to_string(),
        });
    }
    let search_threads = parse_search_threads(&cli.search_threads)?;

    let base_path: &Path = &cli.dataset.join("base.fvecs");
    let query_path: &Path = &cli.dataset.join("query.fvecs");
    let gt_path: &Path = &cli.dataset.join("groundtruth.ivecs");

    let (base_dim, base_vectors) = fvecs::read_fvecs(base_path)?;
    let (query_dim, query_vectors) = fvecs::read_fvecs(query_path)?;
    let (gt_dim, ground_truth) = fvecs::read_ivecs(gt_path)?;

    println!("Base dimension: {base_dim}");
    println!("Base num vectors: {}", base_vectors.len());
    println!("Query dimension: {query_dim}");
    println!("Query num vectors: {}", query_vectors.len());
    println!("Ground truth dimension: {gt_dim}");
    println!("Ground truth num vectors: {}", ground_truth.len());

    println!("\nStarted build index: {} (index-threads={})", cli.index_type, cli.index_threads);
    let build_started = Instant::now();
    let engine = Engine::build(kind, &base_vectors, cli)?;
    let build_elapsed = build_started.elapsed();
    info!(index_type = %cli.index_type, ms = build_elapsed.as_millis(), "build complete");
    println!("Indexing time: {} ms", build_elapsed.as_millis());

    for &threads in &search_threads {
        let search_started = Instant::now();
        let mut total_recall = 0.0;
        for (i, query) in query_vectors.iter().enumerate() {
            let retrieved = engine.search(query, cli.k, cli.ef_search)?;
            total_recall += recall_at_k(&retrieved, &ground_truth[i], cli.k);
        }
        let search_elapsed = search_started.elapsed();
        let queries_per_second = if search_elapsed.as_secs_f64() > 0.0 {
            query_vectors.len() as f64 / search_elapsed.as_secs_f64()
        } else {
            f64::INFINITY
        };
        let avg_recall = total_recall / query_vectors.len() as f64;

        println!("\nNumber of search threads: {threads}");
        println!("Search time: {} ms", search_elapsed.as_millis());
        println!("Queries per second: {queries_per_second:.2}");
        println!("Average recall@{}: {avg_recall:.4}", cli.k);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
