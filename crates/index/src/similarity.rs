use anyhow::Result;
use async_trait::async_trait;
use ingest::Chunk;

/// Vector similarity lookup over the same chunks the graph was built from.
///
/// Returns the top `k` chunk texts already concatenated; callers treat the
/// result as opaque context, not as a ranked list.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<String>;
}

#[async_trait]
impl<'a, T: SimilaritySearch + ?Sized> SimilaritySearch for &'a T {
    async fn search(&self, query: &str, k: usize) -> Result<String> {
        (**self).search(query, k).await
    }
}

#[async_trait]
impl<T: SimilaritySearch + ?Sized> SimilaritySearch for std::sync::Arc<T> {
    async fn search(&self, query: &str, k: usize) -> Result<String> {
        (**self).search(query, k).await
    }
}

/// Write side of the vector fallback: swaps the indexed chunk set for a new
/// one. Implementations should do all fallible per-chunk work before they
/// touch what is currently indexed.
#[async_trait]
pub trait ChunkIndex: Send + Sync {
    async fn replace_chunks(&self, chunks: &[Chunk]) -> Result<()>;
}

#[async_trait]
impl<T: ChunkIndex + ?Sized> ChunkIndex for std::sync::Arc<T> {
    async fn replace_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        (**self).replace_chunks(chunks).await
    }
}
