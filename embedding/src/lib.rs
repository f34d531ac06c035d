//! Node embedding backends.
//!
//! [`EmbeddingBackend`] is the contract the invite ranker relies on: one
//! fixed-dimension vector for every node of the graph, nothing more.

pub mod kmeans;
pub mod walk;

use circles_core::error::{CirclesError, ErrorCode};
use storage::index::{EgoGraph, EmbeddingError, EmbeddingTable};
use thiserror::Error;

pub use kmeans::EmbeddingKMeans;
pub use walk::{WalkConfig, WalkEmbedder};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbeddingBackendError {
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },
    #[error("embedding table error: {0}")]
    Table(#[from] EmbeddingError),
}

impl CirclesError for EmbeddingBackendError {
    fn error_code(&self) -> ErrorCode {
        match self {
            EmbeddingBackendError::InvalidParameter { .. } => ErrorCode::InvalidArgument,
            EmbeddingBackendError::Table(err) => err.error_code(),
        }
    }
}

/// Produces one vector per graph node.
///
/// The returned table's node set must equal the graph's node set and every
/// vector must have `dimensions` components.
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;

    fn embed(&self, graph: &EgoGraph, dimensions: usize)
        -> Result<EmbeddingTable, EmbeddingBackendError>;
}
