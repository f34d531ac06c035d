pub mod embeddings;
pub mod graph;

pub use embeddings::{cosine_similarity, EmbeddingError, EmbeddingTable};
pub use graph::{EgoGraph, GraphError};
