pub mod chunk;
pub mod chunker;
pub mod reader;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig};
pub use reader::{Document, FileReader};

use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Main ingestion pipeline
pub async fn ingest_file(file_path: &Path) -> Result<Vec<Chunk>> {
    let document = FileReader::read_file(file_path).await?;
    let chunker = Chunker::new(ChunkerConfig::default());

    let chunks = chunker.chunk_document(&document);
    info!(source = %document.source, chunks = chunks.len(), "Ingested file");

    Ok(chunks)
}

/// Ingest entire directory
pub async fn ingest_directory(dir_path: &Path) -> Result<Vec<Chunk>> {
    let documents = FileReader::read_directory(dir_path).await?;
    let chunker = Chunker::new(ChunkerConfig::default());

    let mut all_chunks = Vec::new();

    for document in &documents {
        all_chunks.extend(chunker.chunk_document(document));
    }

    info!(
        documents = documents.len(),
        chunks = all_chunks.len(),
        "Ingested directory"
    );

    Ok(all_chunks)
}

/// Ingest a path that may be either a single file or a directory.
pub async fn ingest_path(path: &Path) -> Result<Vec<Chunk>> {
    if path.is_dir() {
        ingest_directory(path).await
    } else if path.is_file() {
        ingest_file(path).await
    } else {
        anyhow::bail!("Path does not exist: {:?}", path)
    }
}
