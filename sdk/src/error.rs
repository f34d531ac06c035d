use circles_core::error::{CirclesError, ErrorCode};
use circles_core::model::CircleId;
use embedding::EmbeddingBackendError;
use invite::InviteError;
use storage::index::EmbeddingError;
use storage::{DetectionError, PartitionError, ProviderError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("graph provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("community detection error: {0}")]
    Detection(#[from] DetectionError),
    #[error("embedding backend error: {0}")]
    Embedding(#[from] EmbeddingBackendError),
    #[error("embedding table error: {0}")]
    Table(#[from] EmbeddingError),
    #[error("partition error: {0}")]
    Partition(#[from] PartitionError),
    #[error("invite ranking error: {0}")]
    Invite(#[from] InviteError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("algorithm already registered: {0}")]
    AlgorithmAlreadyRegistered(String),
    #[error("unknown circle: {0}")]
    UnknownCircle(CircleId),
    #[error("background task failed: {0}")]
    Task(String),
}

impl CirclesError for SdkError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SdkError::Provider(err) => err.error_code(),
            SdkError::Detection(err) => err.error_code(),
            SdkError::Embedding(err) => err.error_code(),
            SdkError::Table(err) => err.error_code(),
            SdkError::Partition(err) => err.error_code(),
            SdkError::Invite(err) => err.error_code(),
            SdkError::UnknownAlgorithm(_) | SdkError::UnknownCircle(_) => ErrorCode::NotFound,
            SdkError::InvalidConfig(_) | SdkError::AlgorithmAlreadyRegistered(_) => {
                ErrorCode::InvalidArgument
            }
            SdkError::Task(_) => ErrorCode::Internal,
        }
    }
}

impl From<tokio::task::JoinError> for SdkError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value.to_string())
    }
}
