use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::embeddings::EmbeddingClient;
use crate::similarity::{ChunkIndex, SimilaritySearch};

/// Qdrant REST collection holding one point per chunk, used as the
/// vector-similarity fallback.
pub struct QdrantIndexer {
    base_url: String,
    client: reqwest::Client,
    embedding_client: EmbeddingClient,
    collection_name: String,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct UpsertPoints {
    points: Vec<Point>,
}

#[derive(Serialize)]
struct Point {
    id: u64,
    vector: Vec<f32>,
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Option<ChunkPayload>,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    text: String,
}

impl QdrantIndexer {
    pub fn new(
        base_url: String,
        embedding_client: EmbeddingClient,
        collection_name: String,
    ) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            embedding_client,
            collection_name,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection_name)
    }

    /// Drop the collection (if any) and recreate it empty with the given
    /// vector size.
    async fn reset_collection(&self, dimension: usize) -> Result<()> {
        let url = self.collection_url();

        let response = self.client.delete(&url).send().await
            .context("Failed to reach Qdrant")?;
        // 404 just means there was nothing to drop
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("Failed to delete collection: {}", response.status());
        }

        let create_req = CreateCollection {
            vectors: VectorParams {
                size: dimension,
                distance: "Cosine",
            },
        };

        let response = self.client
            .put(&url)
            .json(&create_req)
            .send()
            .await
            .context("Failed to reach Qdrant")?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Failed to create collection: {}", error_text);
        }

        info!(collection = %self.collection_name, dimension, "Collection recreated");
        Ok(())
    }

    /// Embed every chunk without touching the collection; point ids follow
    /// chunk order.
    async fn prepare_points(&self, chunks: &[ingest::Chunk]) -> Result<Vec<Point>> {
        let mut points = Vec::with_capacity(chunks.len());

        for (idx, chunk) in chunks.iter().enumerate() {
            let vector = self.embedding_client
                .embed(&chunk.text)
                .await
                .with_context(|| format!("Failed to embed chunk {}", idx))?;

            points.push(Point {
                id: idx as u64,
                vector,
                payload: chunk_payload(idx, chunk),
            });
        }

        Ok(points)
    }

    async fn upsert_points(&self, points: Vec<Point>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let count = points.len();
        let url = format!("{}/points?wait=true", self.collection_url());
        let response = self.client
            .put(&url)
            .json(&UpsertPoints { points })
            .send()
            .await
            .context("Failed to reach Qdrant")?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Failed to upsert points: {}", error_text);
        }

        info!(collection = %self.collection_name, points = count, "Chunks indexed");
        Ok(())
    }

    /// Reachability check for health reporting
    pub async fn ping(&self) -> Result<()> {
        let response = self.client.get(&self.base_url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Qdrant returned {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkIndex for QdrantIndexer {
    /// Embedding failures leave the existing collection untouched. Only the
    /// drop and upsert that follow can leave it partly filled.
    async fn replace_chunks(&self, chunks: &[ingest::Chunk]) -> Result<()> {
        let points = self.prepare_points(chunks).await?;

        let dimension = match points.first() {
            Some(point) => point.vector.len(),
            None => self.embedding_client.get_dimension().await?,
        };

        self.reset_collection(dimension).await?;
        self.upsert_points(points).await
    }
}

#[async_trait]
impl SimilaritySearch for QdrantIndexer {
    async fn search(&self, query: &str, k: usize) -> Result<String> {
        let vector = self.embedding_client
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let url = format!("{}/points/search", self.collection_url());
        let body = json!({
            "vector": vector,
            "limit": k,
            "with_payload": true
        });

        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send search request to Qdrant")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Qdrant search failed: {}", error_text);
        }

        let result: SearchResponse = response.json().await
            .context("Failed to parse Qdrant response")?;

        Ok(join_hits(result))
    }
}

fn chunk_payload(idx: usize, chunk: &ingest::Chunk) -> serde_json::Value {
    json!({
        "chunk_id": crate::builder::chunk_id(idx),
        "text": chunk.text,
        "source": chunk.source,
        "page": chunk.page,
    })
}

fn join_hits(result: SearchResponse) -> String {
    result
        .result
        .into_iter()
        .filter_map(|point| point.payload)
        .map(|payload| payload.text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_payload_carries_graph_chunk_id() {
        let chunk = ingest::Chunk::new("Magma rises.", "volcanoes.txt", Some(2));

        let payload = chunk_payload(3, &chunk);

        assert_eq!(payload["chunk_id"], "chunk_3");
        assert_eq!(payload["text"], "Magma rises.");
        assert_eq!(payload["page"], 2);
    }

    #[test]
    fn test_join_hits_skips_missing_payloads() {
        let raw = r#"{"result": [
            {"id": 0, "score": 0.9, "payload": {"text": "Plates move."}},
            {"id": 1, "score": 0.8},
            {"id": 2, "score": 0.7, "payload": {"text": "Magma rises."}}
        ], "status": "ok", "time": 0.001}"#;

        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(join_hits(parsed), "Plates move.\nMagma rises.");
    }
}
