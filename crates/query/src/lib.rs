pub mod context;
pub mod engine;
pub mod error;
pub mod grounding;
pub mod hybrid;
pub mod llm;
pub mod retriever;

pub use context::ContextAssembler;
pub use engine::{Answer, GraphRagEngine, QueryContext, RetrievalConfig};
pub use error::QueryError;
pub use grounding::QueryGrounder;
pub use hybrid::{HybridContext, HybridPolicy};
pub use retriever::{GraphRetriever, Retrieval, reasoning_path};
