pub mod circles;
pub mod community;
pub mod index;
pub mod provider;

pub use circles::{build_circles, CircleGroup, CircleGroups, PartitionError};
pub use community::{CommunityDetector, DetectionError, Leiden, Louvain, ModularitySettings};
pub use index::{EgoGraph, EmbeddingTable};
pub use provider::{EdgeListProvider, GraphProvider, InMemoryProvider, ProviderError};
