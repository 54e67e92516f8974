use anyhow::{Context, Result};
use index::SimilaritySearch;
use serde::Serialize;
use tracing::info;

pub const DEFAULT_MIN_GRAPH_CHUNKS: usize = 1;
pub const DEFAULT_MIN_CONTEXT_CHARS: usize = 400;
pub const DEFAULT_VECTOR_TOP_K: usize = 3;

/// Threshold gate deciding whether graph context stands alone or gets
/// vector-search context appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridPolicy {
    pub min_graph_chunks: usize,
    pub min_context_chars: usize,
    pub vector_top_k: usize,
}

impl Default for HybridPolicy {
    fn default() -> Self {
        Self {
            min_graph_chunks: DEFAULT_MIN_GRAPH_CHUNKS,
            min_context_chars: DEFAULT_MIN_CONTEXT_CHARS,
            vector_top_k: DEFAULT_VECTOR_TOP_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HybridContext {
    pub context: String,
    pub used_vector_fallback: bool,
}

impl HybridPolicy {
    pub fn needs_fallback(&self, chunk_count: usize, context_chars: usize) -> bool {
        chunk_count < self.min_graph_chunks || context_chars < self.min_context_chars
    }

    /// Graph context alone, or graph context + blank line + top-k similarity
    /// text. The separator is added even when the graph context is empty.
    pub async fn merge<S: SimilaritySearch + ?Sized>(
        &self,
        question: &str,
        graph_context: String,
        chunk_count: usize,
        similarity: &S,
    ) -> Result<HybridContext> {
        let context_chars = graph_context.chars().count();

        if !self.needs_fallback(chunk_count, context_chars) {
            info!(chunks = chunk_count, chars = context_chars, "Graph context sufficient");
            return Ok(HybridContext {
                context: graph_context,
                used_vector_fallback: false,
            });
        }

        info!(
            chunks = chunk_count,
            chars = context_chars,
            k = self.vector_top_k,
            "Graph context insufficient, using vector fallback"
        );
        let vector_context = similarity
            .search(question, self.vector_top_k)
            .await
            .context("Similarity search failed")?;

        Ok(HybridContext {
            context: format!("{}\n\n{}", graph_context, vector_context),
            used_vector_fallback: true,
        })
    }
}
