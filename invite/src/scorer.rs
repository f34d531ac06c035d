//! Per-candidate evidence against a target circle.
//!
//! Both scores are means over the circle's members, summed in the order the
//! members are given so results reproduce exactly.

use crate::error::InviteError;
use circles_core::model::NodeId;
use storage::index::{cosine_similarity, EgoGraph, EmbeddingTable};

/// Mean number of friends `candidate` shares with each circle member.
///
/// Returns 0.0 for an empty circle.
pub fn common_neighbors_score(
    graph: &EgoGraph,
    candidate: NodeId,
    members: &[NodeId],
) -> Result<f64, InviteError> {
    graph.neighbors(candidate)?;
    if members.is_empty() {
        return Ok(0.0);
    }

    let mut sum = 0.0;
    for member in members {
        sum += graph.common_neighbor_count(candidate, *member)? as f64;
    }
    Ok(sum / members.len() as f64)
}

/// Mean cosine similarity between the candidate's vector and each member's.
///
/// Returns 0.0 for an empty circle.
pub fn embedding_similarity_score(
    embeddings: &EmbeddingTable,
    candidate: NodeId,
    members: &[NodeId],
) -> Result<f64, InviteError> {
    let candidate_vec = embeddings.vector(candidate)?;
    if members.is_empty() {
        return Ok(0.0);
    }

    let mut sum = 0.0;
    for member in members {
        sum += cosine_similarity(candidate_vec, embeddings.vector(*member)?);
    }
    Ok(sum / members.len() as f64)
}
