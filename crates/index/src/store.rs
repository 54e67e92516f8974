//! In-memory knowledge graph: nodes, directed labelled edges, and the
//! entity → chunk grounding index.

use extract::Relation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Callers must only look up ids the graph handed them.
    #[error("node not found in graph: {0}")]
    NodeNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Chunk {
        text: String,
        source: String,
        page: Option<u32>,
    },
    Entity,
    Concept,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Chunk { .. } => "Chunk",
            NodeKind::Entity => "Entity",
            NodeKind::Concept => "Concept",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn is_entity(&self) -> bool {
        matches!(self.kind, NodeKind::Entity)
    }

    /// Chunk text, or `None` for entity and concept nodes
    pub fn chunk_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Chunk { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub relation: Relation,
    pub target: String,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{}--> {}", self.source, self.relation, self.target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub chunk_count: usize,
    pub entity_count: usize,
    pub concept_count: usize,
    pub edge_count: usize,
    pub grounded_entity_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: Vec<Node>,
    node_to_idx: HashMap<String, usize>,
    edges: Vec<Edge>,
    entity_chunks: HashMap<String, Vec<String>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless the id is already taken. First write wins:
    /// a repeated id keeps its original kind and metadata.
    pub fn add_node(&mut self, id: impl Into<String>, kind: NodeKind) {
        let id = id.into();
        if self.node_to_idx.contains_key(&id) {
            return;
        }

        self.node_to_idx.insert(id.clone(), self.nodes.len());
        self.nodes.push(Node { id, kind });
    }

    /// Appends unconditionally; duplicates and dangling endpoints are allowed.
    pub fn add_edge(&mut self, source: impl Into<String>, relation: Relation, target: impl Into<String>) {
        self.edges.push(Edge {
            source: source.into(),
            relation,
            target: target.into(),
        });
    }

    /// Record that `chunk_id` grounds `entity`. Duplicates are kept.
    pub fn map_chunk(&mut self, entity: impl Into<String>, chunk_id: impl Into<String>) {
        self.entity_chunks
            .entry(entity.into())
            .or_default()
            .push(chunk_id.into());
    }

    pub fn node(&self, id: &str) -> Result<&Node, GraphError> {
        self.node_to_idx
            .get(id)
            .map(|&idx| &self.nodes[idx])
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_to_idx.contains_key(id)
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn entities(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_entity())
    }

    /// Chunks grounding `entity`; empty if it was never a triple subject.
    pub fn chunks_for(&self, entity: &str) -> &[String] {
        self.entity_chunks
            .get(entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            edge_count: self.edges.len(),
            grounded_entity_count: self.entity_chunks.len(),
            ..GraphStats::default()
        };

        for node in &self.nodes {
            match node.kind {
                NodeKind::Chunk { .. } => stats.chunk_count += 1,
                NodeKind::Entity => stats.entity_count += 1,
                NodeKind::Concept => stats.concept_count += 1,
            }
        }

        stats
    }
}
