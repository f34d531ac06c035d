use circles_core::error::{CirclesError, ErrorCode};
use circles_core::model::NodeId;
use storage::index::{EmbeddingError, GraphError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InviteError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("target circle has no members")]
    EmptyCircle,
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(i64),
    #[error("weight {name} must be a non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("embedding table error: {0}")]
    Embedding(EmbeddingError),
}

impl CirclesError for InviteError {
    fn error_code(&self) -> ErrorCode {
        match self {
            InviteError::UnknownNode(_) | InviteError::Embedding(_) => {
                ErrorCode::FailedPrecondition
            }
            InviteError::EmptyCircle
            | InviteError::InvalidTopK(_)
            | InviteError::InvalidWeight { .. } => ErrorCode::InvalidArgument,
        }
    }
}

impl From<GraphError> for InviteError {
    fn from(value: GraphError) -> Self {
        match value {
            GraphError::UnknownNode(id) => Self::UnknownNode(id),
        }
    }
}

impl From<EmbeddingError> for InviteError {
    fn from(value: EmbeddingError) -> Self {
        match value {
            EmbeddingError::UnknownNode(id) | EmbeddingError::MissingNode(id) => {
                Self::UnknownNode(id)
            }
            other => Self::Embedding(other),
        }
    }
}
