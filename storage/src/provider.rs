use crate::index::EgoGraph;
use async_trait::async_trait;
use circles_core::error::{CirclesError, ErrorCode};
use circles_core::model::NodeId;
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const EDGE_FILE_EXTENSION: &str = "edges";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no graph data for ego {0}")]
    GraphNotFound(u64),
    #[error("malformed edge on line {line}: {content:?}")]
    MalformedEdge { line: usize, content: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CirclesError for ProviderError {
    fn error_code(&self) -> ErrorCode {
        match self {
            ProviderError::GraphNotFound(_) => ErrorCode::NotFound,
            ProviderError::MalformedEdge { .. } => ErrorCode::InvalidArgument,
            ProviderError::Io(_) => ErrorCode::Internal,
        }
    }
}

/// Source of ego graphs.
#[async_trait]
pub trait GraphProvider: Send + Sync {
    async fn load_graph(&self, ego_id: u64) -> Result<EgoGraph, ProviderError>;

    /// Ego identifiers with data available, ascending and unique.
    async fn available_egos(&self) -> Result<Vec<u64>, ProviderError>;
}

/// Reads `<root>/<ego_id>.edges`, one undirected edge per line.
pub struct EdgeListProvider {
    root: PathBuf,
}

impl EdgeListProvider {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, ego_id: u64) -> PathBuf {
        self.root.join(format!("{ego_id}.{EDGE_FILE_EXTENSION}"))
    }
}

#[async_trait]
impl GraphProvider for EdgeListProvider {
    async fn load_graph(&self, ego_id: u64) -> Result<EgoGraph, ProviderError> {
        let path = self.path_for(ego_id);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ProviderError::GraphNotFound(ego_id));
            }
            Err(err) => return Err(err.into()),
        };

        let graph = parse_edge_list(&text)?;
        info!(
            ego_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded ego graph"
        );
        Ok(graph)
    }

    async fn available_egos(&self) -> Result<Vec<u64>, ProviderError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Edge directory does not exist");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut ids = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EDGE_FILE_EXTENSION) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
            {
                ids.insert(id);
            }
        }

        Ok(ids.into_iter().collect())
    }
}

/// Parse whitespace-separated `u v` pairs. Blank lines are skipped.
pub fn parse_edge_list(text: &str) -> Result<EgoGraph, ProviderError> {
    let mut graph = EgoGraph::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let malformed = || ProviderError::MalformedEdge {
            line: idx + 1,
            content: raw.to_string(),
        };

        let mut fields = line.split_whitespace();
        let (Some(source), Some(target), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };
        let source: NodeId = source.parse().map_err(|_| malformed())?;
        let target: NodeId = target.parse().map_err(|_| malformed())?;

        graph.add_edge(source, target);
    }

    Ok(graph)
}

/// Serves prebuilt graphs, e.g. for tests or hosts that build graphs elsewhere.
#[derive(Default)]
pub struct InMemoryProvider {
    graphs: BTreeMap<u64, EgoGraph>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(mut self, ego_id: u64, graph: EgoGraph) -> Self {
        self.graphs.insert(ego_id, graph);
        self
    }
}

#[async_trait]
impl GraphProvider for InMemoryProvider {
    async fn load_graph(&self, ego_id: u64) -> Result<EgoGraph, ProviderError> {
        self.graphs
            .get(&ego_id)
            .cloned()
            .ok_or(ProviderError::GraphNotFound(ego_id))
    }

    async fn available_egos(&self) -> Result<Vec<u64>, ProviderError> {
        Ok(self.graphs.keys().copied().collect())
    }
}
