use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding `<ego_id>.edges` files.
    pub raw_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_dir: "data/raw".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
    pub walk_length: usize,
    pub num_walks: usize,
    pub window: usize,
    /// Return parameter: higher values discourage stepping back.
    pub p: f64,
    /// In-out parameter: higher values keep walks local.
    pub q: f64,
    pub seed: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 64,
            walk_length: 30,
            num_walks: 10,
            window: 10,
            p: 1.0,
            q: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CommunityConfig {
    pub resolution: f64,
    pub max_levels: usize,
    pub max_iterations: usize,
    pub kmeans_clusters: usize,
    pub seed: u64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_levels: 10,
            max_iterations: 100,
            kmeans_clusters: 8,
            seed: 0,
        }
    }
}

/// How the common-neighbor score is scaled before it is weighted.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// Raw mean count, combined as-is.
    #[default]
    Raw,
    /// Divided by the largest common-neighbor score among the candidates.
    MaxScaled,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    /// Weight of the embedding similarity score.
    pub alpha: f64,
    /// Weight of the common-neighbor score.
    pub beta: f64,
    pub default_top_k: usize,
    pub normalization: ScoreNormalization,
    pub parallel: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            beta: 0.3,
            default_top_k: 10,
            normalization: ScoreNormalization::Raw,
            parallel: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub embedding: EmbeddingConfig,
    pub community: CommunityConfig,
    pub ranking: RankingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(env_source());

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `default.toml` from an explicit directory, then the environment.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let default_file = dir.as_ref().join("default.toml");

        let builder = Config::builder()
            .add_source(File::from(default_file.as_path()).required(false))
            .add_source(env_source());

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Message(
                "embedding.dimensions must be positive".into(),
            ));
        }
        if self.embedding.walk_length == 0 || self.embedding.num_walks == 0 {
            return Err(ConfigError::Message(
                "embedding.walk_length and embedding.num_walks must be positive".into(),
            ));
        }
        for (name, value) in [
            ("ranking.alpha", self.ranking.alpha),
            ("ranking.beta", self.ranking.beta),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.ranking.default_top_k == 0 {
            return Err(ConfigError::Message(
                "ranking.default_top_k must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("CIRCLES")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ranking.normalization, ScoreNormalization::Raw);
        assert_eq!(config.embedding.dimensions, 64);
    }

    #[test]
    fn load_from_overrides_selected_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[ranking]\nalpha = 0.5\nbeta = 0.5\nnormalization = \"max_scaled\"\n\n[embedding]\ndimensions = 16\n",
        )
        .unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.ranking.alpha, 0.5);
        assert_eq!(config.ranking.normalization, ScoreNormalization::MaxScaled);
        assert_eq!(config.embedding.dimensions, 16);
        // Untouched sections keep their defaults.
        assert_eq!(config.embedding.walk_length, 30);
        assert_eq!(config.data.raw_dir, "data/raw");
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut config = AppConfig::default();
        config.ranking.beta = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_dimensions_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[embedding]\ndimensions = 0\n").unwrap();
        assert!(AppConfig::load_from(dir.path()).is_err());
    }
}
