use anyhow::{Context, Result};
use extract::TextGenerator;
use index::{Edge, KnowledgeGraph, SimilaritySearch};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::{ContextAssembler, DEFAULT_MAX_CONTEXT_CHARS};
use crate::error::QueryError;
use crate::grounding::QueryGrounder;
use crate::hybrid::{
    DEFAULT_MIN_CONTEXT_CHARS, DEFAULT_MIN_GRAPH_CHUNKS, DEFAULT_VECTOR_TOP_K, HybridPolicy,
};
use crate::llm::build_answer_prompt;
use crate::retriever::{GraphRetriever, reasoning_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub max_context_chars: usize,
    pub min_graph_chunks: usize,
    pub min_context_chars: usize,
    pub vector_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            min_graph_chunks: DEFAULT_MIN_GRAPH_CHUNKS,
            min_context_chars: DEFAULT_MIN_CONTEXT_CHARS,
            vector_top_k: DEFAULT_VECTOR_TOP_K,
        }
    }
}

impl RetrievalConfig {
    pub fn policy(&self) -> HybridPolicy {
        HybridPolicy {
            min_graph_chunks: self.min_graph_chunks,
            min_context_chars: self.min_context_chars,
            vector_top_k: self.vector_top_k,
        }
    }
}

/// Everything gathered for one question before the answer is generated.
#[derive(Debug, Clone, Serialize)]
pub struct QueryContext {
    pub seed_entities: Vec<String>,
    pub chunk_ids: Vec<String>,
    pub entities_expanded: usize,
    pub graph_context_chars: usize,
    /// Final, possibly merged, context handed to the generator
    pub context: String,
    pub used_vector_fallback: bool,
    pub reasoning_path: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    #[serde(flatten)]
    pub retrieval: QueryContext,
}

pub struct GraphRagEngine<G, S> {
    llm: G,
    similarity: S,
    config: RetrievalConfig,
}

impl<G: TextGenerator, S: SimilaritySearch> GraphRagEngine<G, S> {
    pub fn new(llm: G, similarity: S, config: RetrievalConfig) -> Self {
        Self {
            llm,
            similarity,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Ground, retrieve, assemble and apply the hybrid gate.
    pub async fn answer_query(&self, graph: &KnowledgeGraph, question: &str) -> Result<QueryContext> {
        let question = validate_question(question)?;

        let seed_entities = QueryGrounder::new(&self.llm)
            .ground(question, Some(graph))
            .await?;

        let retrieval = GraphRetriever::new(graph).retrieve(&seed_entities);

        let graph_context = ContextAssembler::new(self.config.max_context_chars)
            .assemble(graph, &retrieval.chunk_ids)?;
        let graph_context_chars = graph_context.chars().count();

        let merged = self.config
            .policy()
            .merge(question, graph_context, retrieval.chunk_ids.len(), &self.similarity)
            .await?;

        info!(
            seeds = seed_entities.len(),
            chunks = retrieval.chunk_ids.len(),
            expanded = retrieval.entities_expanded,
            fallback = merged.used_vector_fallback,
            "Query context ready"
        );

        Ok(QueryContext {
            reasoning_path: reasoning_path(graph, &seed_entities),
            seed_entities,
            chunk_ids: retrieval.chunk_ids,
            entities_expanded: retrieval.entities_expanded,
            graph_context_chars,
            context: merged.context,
            used_vector_fallback: merged.used_vector_fallback,
        })
    }

    /// `answer_query` followed by answer synthesis. Any failure is returned
    /// as-is; there is no fallback answer.
    pub async fn answer(&self, graph: &KnowledgeGraph, question: &str) -> Result<Answer> {
        let retrieval = self.answer_query(graph, question).await?;

        let prompt = build_answer_prompt(question.trim(), &retrieval.context);
        let answer = self.llm
            .generate(&prompt)
            .await
            .context("Failed to generate answer")?;

        Ok(Answer {
            answer: answer.trim().to_string(),
            retrieval,
        })
    }
}

fn validate_question(question: &str) -> Result<&str, QueryError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(QueryError::EmptyQuestion);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLlm(AtomicUsize);

    #[async_trait]
    impl TextGenerator for CountingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("[]".to_string())
        }
    }

    struct NoSearch;

    #[async_trait]
    impl SimilaritySearch for NoSearch {
        async fn search(&self, _query: &str, _k: usize) -> Result<String> {
            anyhow::bail!("similarity search should not be called")
        }
    }

    #[tokio::test]
    async fn test_empty_question_rejected_before_any_call() {
        let engine = GraphRagEngine::new(CountingLlm(AtomicUsize::new(0)), NoSearch, RetrievalConfig::default());
        let graph = KnowledgeGraph::new();

        let err = engine.answer(&graph, "   \n").await.unwrap_err();

        assert_eq!(err.downcast_ref::<QueryError>(), Some(&QueryError::EmptyQuestion));
        assert_eq!(engine.llm.0.load(Ordering::SeqCst), 0);
    }

    /// Grounds to nothing, then refuses to write the answer.
    struct AnswerDownLlm;

    #[async_trait]
    impl TextGenerator for AnswerDownLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.starts_with("You are a helpful AI assistant.") {
                anyhow::bail!("503 Service Unavailable");
            }
            Ok("[]".to_string())
        }
    }

    struct FixedSearch(&'static str);

    #[async_trait]
    impl SimilaritySearch for FixedSearch {
        async fn search(&self, _query: &str, _k: usize) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct DownSearch;

    #[async_trait]
    impl SimilaritySearch for DownSearch {
        async fn search(&self, _query: &str, _k: usize) -> Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_answer_generation_failure_is_surfaced() {
        let engine = GraphRagEngine::new(AnswerDownLlm, FixedSearch("Magma rises."), RetrievalConfig::default());
        let graph = KnowledgeGraph::new();

        let err = engine.answer(&graph, "What causes a volcano?").await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to generate answer");
        assert!(format!("{:#}", err).contains("503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_similarity_failure_during_fallback_is_surfaced() {
        let engine = GraphRagEngine::new(CountingLlm(AtomicUsize::new(0)), DownSearch, RetrievalConfig::default());
        let graph = KnowledgeGraph::new();

        // Empty graph: nothing retrieved, so the vector fallback must run
        let err = engine.answer_query(&graph, "What causes a volcano?").await.unwrap_err();

        assert!(format!("{:#}", err).contains("connection refused"));
        // Only the grounding call reached the model; no answer was attempted
        assert_eq!(engine.llm.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_config_matches_policy_defaults() {
        assert_eq!(RetrievalConfig::default().policy(), HybridPolicy::default());
        assert_eq!(RetrievalConfig::default().max_context_chars, 2000);
    }
}
