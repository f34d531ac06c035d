use crate::error::SdkError;
use circles_core::model::{CircleId, NodeId, Partition};
use embedding::EmbeddingBackend;
use invite::{InviteCandidate, InviteContext, InviteRanker};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use storage::community::modularity;
use storage::{
    build_circles, CircleGroups, CommunityDetector, EgoGraph, EmbeddingTable, GraphProvider,
};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EgoSummary {
    pub ego_id: u64,
    pub algorithm: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub circle_count: usize,
    /// `(circle, size)`, largest first.
    pub circle_sizes: Vec<(CircleId, usize)>,
    pub modularity: f64,
}

/// One ego network with its circles and embeddings, ready to answer
/// invite queries. Immutable once prepared.
#[derive(Debug, Clone)]
pub struct PreparedEgo {
    ego_id: u64,
    algorithm: String,
    graph: Arc<EgoGraph>,
    partition: Partition,
    circles: CircleGroups,
    embeddings: Arc<EmbeddingTable>,
    resolution: f64,
}

impl PreparedEgo {
    /// Loads the graph, then runs detection and embedding on the blocking
    /// pool concurrently.
    pub async fn prepare(
        provider: &dyn GraphProvider,
        detector: Arc<dyn CommunityDetector>,
        embedder: Arc<dyn EmbeddingBackend>,
        ego_id: u64,
        dimensions: usize,
    ) -> Result<Self, SdkError> {
        let start = Instant::now();
        let graph = Arc::new(provider.load_graph(ego_id).await?);
        let algorithm = detector.name().to_string();

        let detect_graph = Arc::clone(&graph);
        let detection = tokio::task::spawn_blocking(move || detector.detect(&detect_graph));
        let embed_graph = Arc::clone(&graph);
        let embedding =
            tokio::task::spawn_blocking(move || embedder.embed(&embed_graph, dimensions));

        let (partition, embeddings) = tokio::try_join!(detection, embedding)?;
        let prepared =
            Self::from_parts(ego_id, algorithm, graph, partition?, Arc::new(embeddings?))?;

        info!(
            ego_id,
            algorithm = %prepared.algorithm,
            nodes = prepared.graph.node_count(),
            circles = prepared.circles.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Prepared ego network"
        );
        Ok(prepared)
    }

    /// Assembles a prepared ego from precomputed pieces. The partition must
    /// cover exactly the graph's nodes, and so must the embedding table.
    pub fn from_parts(
        ego_id: u64,
        algorithm: impl Into<String>,
        graph: Arc<EgoGraph>,
        partition: Partition,
        embeddings: Arc<EmbeddingTable>,
    ) -> Result<Self, SdkError> {
        let circles = build_circles(&graph, &partition)?;
        embeddings.ensure_covers(&graph)?;
        Ok(Self {
            ego_id,
            algorithm: algorithm.into(),
            graph,
            partition,
            circles,
            embeddings,
            resolution: 1.0,
        })
    }

    /// Resolution `γ` the summary's modularity is reported at. Defaults to 1.0.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn ego_id(&self) -> u64 {
        self.ego_id
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn graph(&self) -> &EgoGraph {
        &self.graph
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn circles(&self) -> &CircleGroups {
        &self.circles
    }

    pub fn embeddings(&self) -> &EmbeddingTable {
        &self.embeddings
    }

    pub fn summary(&self) -> EgoSummary {
        EgoSummary {
            ego_id: self.ego_id,
            algorithm: self.algorithm.clone(),
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            circle_count: self.circles.len(),
            circle_sizes: self.circles.sizes(),
            modularity: modularity(&self.graph, &self.partition, self.resolution),
        }
    }

    /// First `limit` members of a circle, in partition order.
    pub fn circle_preview(
        &self,
        circle_id: CircleId,
        limit: usize,
    ) -> Result<&[NodeId], SdkError> {
        let circle = self
            .circles
            .get(circle_id)
            .ok_or(SdkError::UnknownCircle(circle_id))?;
        Ok(&circle.members[..limit.min(circle.members.len())])
    }

    pub fn suggest_invites(
        &self,
        ranker: &InviteRanker,
        circle_id: CircleId,
        top_k: i64,
    ) -> Result<Vec<InviteCandidate>, SdkError> {
        let circle = self
            .circles
            .get(circle_id)
            .ok_or(SdkError::UnknownCircle(circle_id))?;
        let ctx = InviteContext {
            graph: &self.graph,
            members: &circle.members,
            embeddings: &self.embeddings,
        };
        let ranked = ranker.rank(&ctx, top_k)?;
        debug!(
            ego_id = self.ego_id,
            circle_id,
            returned = ranked.len(),
            "Suggested invites"
        );
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circles_core::error::{CirclesError, ErrorCode};
    use invite::ScoreWeights;

    fn scenario() -> PreparedEgo {
        let graph = Arc::new(EgoGraph::from_edges([(1, 2), (1, 3), (2, 3), (3, 4), (4, 5)]));
        let partition: Partition = [(1, 0), (2, 0), (3, 0), (4, 1), (5, 1)].into_iter().collect();
        let table = EmbeddingTable::new(
            vec![1, 2, 3, 4, 5],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.9, 0.1, 0.0],
                vec![0.7, 0.7, 0.0],
                vec![0.7, 0.6, 0.1],
                vec![-0.5, -0.5, 0.7],
            ],
            3,
        )
        .unwrap();
        PreparedEgo::from_parts(7, "manual", graph, partition, Arc::new(table)).unwrap()
    }

    #[test]
    fn test_summary() {
        let summary = scenario().summary();
        assert_eq!(summary.ego_id, 7);
        assert_eq!(summary.node_count, 5);
        assert_eq!(summary.edge_count, 5);
        assert_eq!(summary.circle_count, 2);
        assert_eq!(summary.circle_sizes, vec![(0, 3), (1, 2)]);
        assert!(summary.modularity > 0.0);
    }

    #[test]
    fn test_summary_uses_detection_resolution() {
        let prepared = scenario().with_resolution(2.0);
        let expected = modularity(prepared.graph(), prepared.partition(), 2.0);
        let summary = prepared.summary();
        assert!((summary.modularity - expected).abs() < 1e-12);
        assert!((summary.modularity - scenario().summary().modularity).abs() > 1e-6);
    }

    #[test]
    fn test_circle_preview_follows_partition_order() {
        let graph = Arc::new(EgoGraph::from_edges([(1, 2), (2, 3)]));
        let partition: Partition = [(3, 0), (1, 0), (2, 0)].into_iter().collect();
        let table = EmbeddingTable::new(vec![1, 2, 3], vec![vec![1.0]; 3], 1).unwrap();
        let prepared =
            PreparedEgo::from_parts(1, "manual", graph, partition, Arc::new(table)).unwrap();
        assert_eq!(prepared.circle_preview(0, 2).unwrap(), &[3, 1]);
    }

    #[test]
    fn test_circle_preview() {
        let prepared = scenario();
        assert_eq!(prepared.circle_preview(0, 2).unwrap(), &[1, 2]);
        assert_eq!(prepared.circle_preview(1, 10).unwrap(), &[4, 5]);
        assert!(matches!(
            prepared.circle_preview(9, 1),
            Err(SdkError::UnknownCircle(9))
        ));
    }

    #[test]
    fn test_suggest_invites() {
        let prepared = scenario();
        let ranker = InviteRanker::new(ScoreWeights::new(0.5, 0.5));
        let ranked = prepared.suggest_invites(&ranker, 0, 10).unwrap();
        let order: Vec<NodeId> = ranked.iter().map(|c| c.candidate).collect();
        assert_eq!(order, vec![4, 5]);

        let err = prepared.suggest_invites(&ranker, 0, 0).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InvalidArgument);
        let err = prepared.suggest_invites(&ranker, 3, 5).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_from_parts_rejects_partial_partition() {
        let graph = Arc::new(EgoGraph::from_edges([(1, 2), (2, 3)]));
        let partition: Partition = [(1, 0), (2, 0)].into_iter().collect();
        let table = EmbeddingTable::new(vec![1, 2, 3], vec![vec![1.0]; 3], 1).unwrap();
        let err =
            PreparedEgo::from_parts(1, "manual", graph, partition, Arc::new(table)).unwrap_err();
        assert!(matches!(err, SdkError::Partition(_)));
        assert_eq!(err.error_code(), ErrorCode::FailedPrecondition);
    }
}
