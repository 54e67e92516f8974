use index::{Edge, KnowledgeGraph};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Retrieval {
    /// Distinct chunk ids, in the order they were first reached
    pub chunk_ids: Vec<String>,
    /// Neighbours marked visited by the one-hop pass
    pub entities_expanded: usize,
}

pub struct GraphRetriever<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> GraphRetriever<'a> {
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    pub fn retrieve_chunks(&self, seeds: &[String]) -> Vec<String> {
        self.retrieve(seeds).chunk_ids
    }

    /// Direct grounding of every seed, then a single hop across its
    /// outgoing edges.
    ///
    /// The hop marks each unvisited neighbour as visited and adds the chunks
    /// grounded to the edge's *source* (the seed itself), not to the
    /// neighbour. Neighbour chunks are never pulled in.
    pub fn retrieve(&self, seeds: &[String]) -> Retrieval {
        let mut chunk_ids = Vec::new();
        let mut seen_chunks = HashSet::new();
        let mut visited: HashSet<&str> = seeds.iter().map(String::as_str).collect();
        let mut entities_expanded = 0;

        for entity in seeds {
            push_unique(self.graph.chunks_for(entity), &mut seen_chunks, &mut chunk_ids);

            for edge in self.graph.edges() {
                if edge.source == *entity && !visited.contains(edge.target.as_str()) {
                    visited.insert(edge.target.as_str());
                    entities_expanded += 1;
                    push_unique(self.graph.chunks_for(&edge.source), &mut seen_chunks, &mut chunk_ids);
                }
            }
        }

        Retrieval {
            chunk_ids,
            entities_expanded,
        }
    }
}

fn push_unique<'g>(ids: &'g [String], seen: &mut HashSet<&'g str>, out: &mut Vec<String>) {
    for id in ids {
        if seen.insert(id.as_str()) {
            out.push(id.clone());
        }
    }
}

/// Edges whose subject is one of the seeds, in graph order. Exposed for
/// inspection only; retrieval does not consume it.
pub fn reasoning_path(graph: &KnowledgeGraph, seeds: &[String]) -> Vec<Edge> {
    let seeds: HashSet<&str> = seeds.iter().map(String::as_str).collect();

    graph
        .edges()
        .iter()
        .filter(|edge| seeds.contains(edge.source.as_str()))
        .cloned()
        .collect()
}
