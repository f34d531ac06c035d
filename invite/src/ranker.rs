use crate::error::InviteError;
use crate::scorer::{common_neighbors_score, embedding_similarity_score};
use circles_core::config::{RankingConfig, ScoreNormalization};
use circles_core::model::NodeId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use storage::index::{EgoGraph, EmbeddingTable};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Weight of the embedding similarity score.
    pub alpha: f64,
    /// Weight of the common-neighbor score.
    pub beta: f64,
}

impl ScoreWeights {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    fn validate(&self) -> Result<(), InviteError> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(InviteError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Everything one ranking request reads. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct InviteContext<'a> {
    pub graph: &'a EgoGraph,
    /// Members of the target circle, in the order their scores are summed.
    pub members: &'a [NodeId],
    /// Its node ordering is the candidate enumeration order.
    pub embeddings: &'a EmbeddingTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteCandidate {
    pub candidate: NodeId,
    pub total: f64,
    /// Raw mean common-neighbor count, before any normalization.
    pub common_neighbors: f64,
    pub embedding_similarity: f64,
}

#[derive(Debug, Clone)]
pub struct InviteRanker {
    weights: ScoreWeights,
    normalization: ScoreNormalization,
    parallel: bool,
}

impl InviteRanker {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            normalization: ScoreNormalization::Raw,
            parallel: false,
        }
    }

    pub fn from_config(config: &RankingConfig) -> Self {
        Self {
            weights: ScoreWeights::new(config.alpha, config.beta),
            normalization: config.normalization,
            parallel: config.parallel,
        }
    }

    pub fn with_normalization(mut self, normalization: ScoreNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Score candidates on the rayon pool. Output is identical either way.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Top `top_k` non-members by `alpha * embedding + beta * common_neighbors`.
    ///
    /// Equal totals keep the embedding table's node order. Fewer than
    /// `top_k` candidates is not an error.
    pub fn rank(
        &self,
        ctx: &InviteContext<'_>,
        top_k: i64,
    ) -> Result<Vec<InviteCandidate>, InviteError> {
        if top_k < 1 {
            return Err(InviteError::InvalidTopK(top_k));
        }
        if ctx.members.is_empty() {
            return Err(InviteError::EmptyCircle);
        }
        self.weights.validate()?;
        if let Some(unknown) = ctx.members.iter().find(|m| !ctx.graph.contains(**m)) {
            return Err(InviteError::UnknownNode(*unknown));
        }
        ctx.embeddings.ensure_covers(ctx.graph)?;

        let member_set: HashSet<NodeId> = ctx.members.iter().copied().collect();
        let candidates: Vec<NodeId> = ctx
            .embeddings
            .nodes()
            .iter()
            .copied()
            .filter(|id| !member_set.contains(id))
            .collect();

        let score = |candidate: &NodeId| -> Result<(NodeId, f64, f64), InviteError> {
            let cn = common_neighbors_score(ctx.graph, *candidate, ctx.members)?;
            let emb = embedding_similarity_score(ctx.embeddings, *candidate, ctx.members)?;
            Ok((*candidate, cn, emb))
        };

        let raw: Vec<(NodeId, f64, f64)> = if self.parallel {
            candidates.par_iter().map(score).collect::<Result<_, _>>()?
        } else {
            candidates.iter().map(score).collect::<Result<_, _>>()?
        };

        let cn_scale = match self.normalization {
            ScoreNormalization::Raw => 1.0,
            ScoreNormalization::MaxScaled => {
                let max = raw.iter().map(|(_, cn, _)| *cn).fold(0.0, f64::max);
                if max > 0.0 {
                    1.0 / max
                } else {
                    0.0
                }
            }
        };

        let mut ranked: Vec<InviteCandidate> = raw
            .into_iter()
            .map(|(candidate, cn, emb)| InviteCandidate {
                candidate,
                total: self.weights.alpha * emb + self.weights.beta * cn * cn_scale,
                common_neighbors: cn,
                embedding_similarity: emb,
            })
            .collect();

        // Stable: ties keep enumeration order.
        ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
        let candidate_count = ranked.len();
        ranked.truncate(top_k as usize);

        debug!(
            members = ctx.members.len(),
            candidates = candidate_count,
            returned = ranked.len(),
            parallel = self.parallel,
            "Ranked invite candidates"
        );
        Ok(ranked)
    }
}
