pub mod builder;
pub mod embeddings;
pub mod qdrant_index;
pub mod similarity;
pub mod store;

pub use builder::{BuildReport, GraphBuilder, chunk_id};
pub use embeddings::EmbeddingClient;
pub use qdrant_index::QdrantIndexer;
pub use similarity::{ChunkIndex, SimilaritySearch};
pub use store::{Edge, GraphError, GraphStats, KnowledgeGraph, Node, NodeKind};
