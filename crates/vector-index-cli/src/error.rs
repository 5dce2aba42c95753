//! Error type for the benchmark driver.

use thiserror::Error;

/// Result alias used throughout the CLI crate.
pub type CliResult<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the driver's own concerns (option parsing, dataset
/// I/O); engine errors from `vector-index-core` are wrapped unchanged.
#[derive(Error, Debug)]
pub enum CliError {
    /// A dataset file could not be read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A `.fvecs`/`.ivecs` file violated the format's layout contract.
    #[error("malformed vector file {path}: {message}")]
    MalformedVectorFile {
        /// Path to the offending file.
        path: String,
        /// Description of the layout violation.
        message: String,
    },

    /// An engine build or search call failed.
    #[error("index error: {0}")]
    IndexError(#[from] vector_index_core::Error),

    /// `-t` named an index kind the driver doesn't recognize.
    #[error("unrecognized index kind `{0}` (expected hnsw|sa_tree|swng)")]
    UnknownIndexKind(String),

    /// A thread-count flag was zero or otherwise invalid.
    #[error("invalid thread count for `{flag}`: {value}")]
    InvalidThreadCount {
        /// Name of the offending flag.
        flag: &'static str,
        /// The value supplied on the command line.
        value: String,
    },
}
