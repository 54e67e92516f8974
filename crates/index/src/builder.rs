use extract::{Relation, TextGenerator, TripleExtractor};
use ingest::Chunk;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

use crate::store::{KnowledgeGraph, NodeKind};

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub chunks_processed: usize,
    pub triples_accepted: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

pub fn chunk_id(index: usize) -> String {
    format!("chunk_{}", index)
}

/// Drives triple extraction over an ordered chunk sequence and materializes
/// a fresh graph. Each build starts from nothing.
pub struct GraphBuilder<G> {
    extractor: TripleExtractor<G>,
}

impl<G: TextGenerator> GraphBuilder<G> {
    pub fn new(extractor: TripleExtractor<G>) -> Self {
        Self { extractor }
    }

    pub async fn build(&self, chunks: &[Chunk]) -> KnowledgeGraph {
        self.build_with_report(chunks).await.0
    }

    pub async fn build_with_report(&self, chunks: &[Chunk]) -> (KnowledgeGraph, BuildReport) {
        let start = Instant::now();
        let mut graph = KnowledgeGraph::new();
        let mut triples_accepted = 0;

        for (idx, chunk) in chunks.iter().enumerate() {
            let chunk_id = chunk_id(idx);

            graph.add_node(
                chunk_id.clone(),
                NodeKind::Chunk {
                    text: chunk.text.clone(),
                    source: chunk.source.clone(),
                    page: chunk.page,
                },
            );

            let triples = self.extractor.extract_triples(&chunk.text).await;
            info!(
                chunk = idx + 1,
                total = chunks.len(),
                triples = triples.len(),
                "Processed chunk"
            );
            triples_accepted += triples.len();

            for triple in triples {
                graph.add_node(triple.subject.clone(), NodeKind::Entity);
                graph.add_node(triple.object.clone(), NodeKind::Concept);

                graph.add_edge(triple.subject.clone(), triple.relation, triple.object);
                graph.add_edge(chunk_id.clone(), Relation::Mentions, triple.subject.clone());

                // Only subjects are grounded to the chunk
                graph.map_chunk(triple.subject, chunk_id.clone());
            }
        }

        let report = BuildReport {
            chunks_processed: chunks.len(),
            triples_accepted,
            elapsed: start.elapsed(),
        };
        let stats = graph.stats();
        info!(
            chunks = report.chunks_processed,
            triples = report.triples_accepted,
            entities = stats.entity_count,
            concepts = stats.concept_count,
            edges = stats.edge_count,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Graph built"
        );

        (graph, report)
    }
}
