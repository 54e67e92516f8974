//! Maps a free-text question onto seed entity names.

use anyhow::{Context, Result};
use extract::TextGenerator;
use extract::prompt::build_query_entity_prompt;
use index::KnowledgeGraph;
use serde_json::Value;
use tracing::{debug, info};

pub struct QueryGrounder<'a, G> {
    llm: &'a G,
}

impl<'a, G: TextGenerator> QueryGrounder<'a, G> {
    pub fn new(llm: &'a G) -> Self {
        Self { llm }
    }

    /// Ask the model for entity names first; if it does not answer with a
    /// non-empty JSON array, fall back to substring matching
    /// against the graph's Entity nodes.
    ///
    /// Names from the model are returned as-is, even when the graph has
    /// never heard of them. A failed service call is an error, not a
    /// trigger for the fallback.
    pub async fn ground(&self, question: &str, graph: Option<&KnowledgeGraph>) -> Result<Vec<String>> {
        let prompt = build_query_entity_prompt(question);
        let response = self.llm
            .generate(&prompt)
            .await
            .context("Failed to extract query entities")?;

        if let Some(entities) = parse_entity_list(&response) {
            debug!(entities = ?entities, "Query entities from model");
            return Ok(entities);
        }

        let matched = graph
            .map(|graph| match_entities(graph, question))
            .unwrap_or_default();
        info!(matched = matched.len(), "Model gave no entity list, used graph fallback");

        Ok(matched)
    }
}

/// The whole response must be a non-empty JSON array. String elements are
/// kept as they are, anything else is rendered as compact JSON.
pub fn parse_entity_list(raw: &str) -> Option<Vec<String>> {
    let values = serde_json::from_str::<Vec<Value>>(raw).ok()?;
    if values.is_empty() {
        return None;
    }

    let entities = values
        .into_iter()
        .map(|value| match value {
            Value::String(name) => name,
            other => other.to_string(),
        })
        .collect();

    Some(entities)
}

/// Entity nodes whose name occurs, case-insensitively, anywhere in the
/// question. Graph order is preserved. This is a heuristic: short names
/// match inside unrelated words.
pub fn match_entities(graph: &KnowledgeGraph, question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();

    graph
        .entities()
        .filter(|node| lowered.contains(&node.id.to_lowercase()))
        .map(|node| node.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use index::NodeKind;

    struct Reply(Result<&'static str, &'static str>);

    #[async_trait]
    impl TextGenerator for Reply {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0.map(str::to_string).map_err(anyhow::Error::msg)
        }
    }

    fn volcano_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("volcano", NodeKind::Entity);
        graph.add_node("ash", NodeKind::Concept);
        graph.add_node("Plate", NodeKind::Entity);
        graph
    }

    #[tokio::test]
    async fn test_primary_path_returns_model_entities_verbatim() {
        let llm = Reply(Ok(r#"["volcano", "Iceland"]"#));
        let graph = volcano_graph();

        let seeds = QueryGrounder::new(&llm)
            .ground("Why does Iceland have a volcano?", Some(&graph))
            .await
            .unwrap();

        // Iceland is not in the graph but is still returned
        assert_eq!(seeds, ["volcano", "Iceland"]);
    }

    #[tokio::test]
    async fn test_fallback_substring_match() {
        let llm = Reply(Ok("The entities are volcano and magma."));
        let graph = volcano_graph();

        let seeds = QueryGrounder::new(&llm)
            .ground("What causes a volcano?", Some(&graph))
            .await
            .unwrap();

        assert_eq!(seeds, ["volcano"]);
    }

    #[tokio::test]
    async fn test_empty_array_triggers_fallback() {
        let llm = Reply(Ok("[]"));
        let graph = volcano_graph();

        let seeds = QueryGrounder::new(&llm)
            .ground("How do PLATES move?", Some(&graph))
            .await
            .unwrap();

        assert_eq!(seeds, ["Plate"]);
    }

    #[tokio::test]
    async fn test_fallback_ignores_concepts() {
        let llm = Reply(Ok("not json"));
        let graph = volcano_graph();

        let seeds = QueryGrounder::new(&llm)
            .ground("Is ash dangerous?", Some(&graph))
            .await
            .unwrap();

        assert!(seeds.is_empty());
    }

    #[tokio::test]
    async fn test_no_graph_and_no_list_is_empty() {
        let llm = Reply(Ok("sorry"));

        let seeds = QueryGrounder::new(&llm)
            .ground("What causes a volcano?", None)
            .await
            .unwrap();

        assert!(seeds.is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_is_surfaced() {
        let llm = Reply(Err("503 Service Unavailable"));
        let graph = volcano_graph();

        let result = QueryGrounder::new(&llm)
            .ground("What causes a volcano?", Some(&graph))
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_short_names_over_match() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("ice", NodeKind::Entity);

        // "ice" inside "Iceland" and "advice": expected false positives
        assert_eq!(match_entities(&graph, "Any advice about Iceland?"), ["ice"]);
    }

    #[tokio::test]
    async fn test_mixed_array_is_kept_without_fallback() {
        let llm = Reply(Ok(r#"["magma", 3]"#));
        let graph = volcano_graph();

        let seeds = QueryGrounder::new(&llm)
            .ground("What causes a volcano?", Some(&graph))
            .await
            .unwrap();

        assert_eq!(seeds, ["magma", "3"]);
    }

    #[test]
    fn test_parse_entity_list_stringifies_non_strings() {
        assert_eq!(parse_entity_list(r#"["a", "b"]"#), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(
            parse_entity_list(r#"["a", 3, null, {"k": 1}]"#),
            Some(vec!["a".to_string(), "3".to_string(), "null".to_string(), r#"{"k":1}"#.to_string()])
        );
        assert_eq!(parse_entity_list("[]"), None);
        assert_eq!(parse_entity_list(r#"{"entities": ["a"]}"#), None);
        assert_eq!(parse_entity_list("  [\"a\"]\n"), Some(vec!["a".to_string()]));
    }
}
