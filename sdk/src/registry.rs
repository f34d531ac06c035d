use crate::error::SdkError;
use circles_core::config::AppConfig;
use embedding::{EmbeddingKMeans, WalkConfig, WalkEmbedder};
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::{CommunityDetector, Leiden, Louvain, ModularitySettings};

/// Community detection backends addressable by name.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: BTreeMap<String, Arc<dyn CommunityDetector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `louvain`, `leiden` and `node2vec-kmeans`, tuned from `config`.
    pub fn with_defaults(config: &AppConfig) -> Self {
        let settings = ModularitySettings {
            resolution: config.community.resolution,
            max_levels: config.community.max_levels,
            max_iterations: config.community.max_iterations,
        };
        let embedder = Arc::new(WalkEmbedder::new(WalkConfig::from(&config.embedding)));
        let kmeans = EmbeddingKMeans::new(
            embedder,
            config.embedding.dimensions,
            config.community.kmeans_clusters,
        )
        .with_seed(config.community.seed);

        let mut registry = Self::new();
        for detector in [
            Arc::new(Louvain::with_settings(settings.clone())) as Arc<dyn CommunityDetector>,
            Arc::new(Leiden::with_settings(settings)),
            Arc::new(kmeans),
        ] {
            registry
                .detectors
                .insert(detector.name().to_string(), detector);
        }
        registry
    }

    pub fn register(&mut self, detector: Arc<dyn CommunityDetector>) -> Result<(), SdkError> {
        let name = normalize_name(detector.name());
        if self.detectors.contains_key(&name) {
            return Err(SdkError::AlgorithmAlreadyRegistered(name));
        }
        self.detectors.insert(name, detector);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn CommunityDetector>, SdkError> {
        self.detectors
            .get(&normalize_name(name))
            .cloned()
            .ok_or_else(|| SdkError::UnknownAlgorithm(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.detectors.keys().map(String::as_str).collect()
    }
}

/// Case-insensitive, ignoring a trailing parenthesised label such as
/// `"Leiden (modern)"`.
fn normalize_name(name: &str) -> String {
    let base = match name.split_once('(') {
        Some((head, _)) => head,
        None => name,
    };
    base.trim().to_lowercase()
}
