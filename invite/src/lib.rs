pub mod error;
pub mod ranker;
pub mod scorer;

pub use error::InviteError;
pub use ranker::{InviteCandidate, InviteContext, InviteRanker, ScoreWeights};
pub use scorer::{common_neighbors_score, embedding_similarity_score};
