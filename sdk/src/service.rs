use crate::error::SdkError;
use crate::registry::DetectorRegistry;
use crate::session::PreparedEgo;
use circles_core::config::AppConfig;
use circles_core::model::CircleId;
use embedding::{EmbeddingBackend, WalkConfig, WalkEmbedder};
use invite::{InviteCandidate, InviteRanker};
use std::sync::Arc;
use storage::{EdgeListProvider, GraphProvider};

/// Entry point for presentation layers: owns the provider, the detector
/// registry, the embedder and the ranker built from one [`AppConfig`].
pub struct CircleService {
    config: AppConfig,
    provider: Arc<dyn GraphProvider>,
    registry: DetectorRegistry,
    embedder: Arc<dyn EmbeddingBackend>,
    ranker: InviteRanker,
}

impl CircleService {
    /// Reads ego networks from `config.data.raw_dir`.
    pub fn from_config(config: AppConfig) -> Result<Self, SdkError> {
        config
            .validate()
            .map_err(|e| SdkError::InvalidConfig(e.to_string()))?;
        let provider = Arc::new(EdgeListProvider::new(&config.data.raw_dir));
        let registry = DetectorRegistry::with_defaults(&config);
        let embedder = Arc::new(WalkEmbedder::new(WalkConfig::from(&config.embedding)));
        let ranker = InviteRanker::from_config(&config.ranking);
        Ok(Self {
            config,
            provider,
            registry,
            embedder,
            ranker,
        })
    }

    pub fn with_provider(mut self, provider: Arc<dyn GraphProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_ranker(mut self, ranker: InviteRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DetectorRegistry {
        &mut self.registry
    }

    pub async fn available_egos(&self) -> Result<Vec<u64>, SdkError> {
        Ok(self.provider.available_egos().await?)
    }

    pub async fn prepare(&self, ego_id: u64, algorithm: &str) -> Result<PreparedEgo, SdkError> {
        let detector = self.registry.resolve(algorithm)?;
        PreparedEgo::prepare(
            self.provider.as_ref(),
            detector,
            Arc::clone(&self.embedder),
            ego_id,
            self.config.embedding.dimensions,
        )
        .await
        .map(|prepared| prepared.with_resolution(self.config.community.resolution))
    }

    /// `top_k` falls back to `ranking.default_top_k`.
    pub fn suggest_invites(
        &self,
        prepared: &PreparedEgo,
        circle_id: CircleId,
        top_k: Option<i64>,
    ) -> Result<Vec<InviteCandidate>, SdkError> {
        let top_k = top_k.unwrap_or(self.config.ranking.default_top_k as i64);
        prepared.suggest_invites(&self.ranker, circle_id, top_k)
    }
}
