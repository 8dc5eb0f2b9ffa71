//! Error types for receval.

use thiserror::Error;

/// Result type for receval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for receval operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Two tables that must share an evaluation-unit index do not.
    ///
    /// This is a programmer-error class: callers are responsible for keeping
    /// predictions, ground truth, and slice assignments aligned. Components
    /// fail loudly here instead of silently reindexing, since implicit
    /// reindexing could silently corrupt fairness numbers.
    #[error("Alignment mismatch: {0}")]
    Misaligned(String),

    /// Invalid table construction (duplicate keys, ragged rows, ...).
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Invalid breakpoint set for binning.
    #[error("Invalid breakpoints: {0}")]
    InvalidBreakpoints(String),

    /// An aggregation was asked to run over zero evaluation units.
    #[error("No data: {0}")]
    NoData(String),

    /// An item identifier has no entry in the catalog.
    #[error("Unknown item {0} in catalog lookup")]
    UnknownItem(i64),

    /// An item identifier has no embedding vector.
    #[error("No embedding for item {0}")]
    MissingEmbedding(i64),

    /// Embedding vectors of inconsistent dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    EmbeddingDim {
        /// Dimension the matrix was created with.
        expected: usize,
        /// Dimension of the offending vector.
        got: usize,
    },

    /// A check name not present in the registry.
    #[error("Unknown check: {0}")]
    UnknownCheck(String),

    /// Dataset loading/parsing error.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an alignment-mismatch error.
    pub fn misaligned(msg: impl Into<String>) -> Self {
        Error::Misaligned(msg.into())
    }

    /// Create an invalid-table error.
    pub fn invalid_table(msg: impl Into<String>) -> Self {
        Error::InvalidTable(msg.into())
    }

    /// Create a no-data error.
    pub fn no_data(msg: impl Into<String>) -> Self {
        Error::NoData(msg.into())
    }

    /// Create a dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Error::Dataset(msg.into())
    }
}
