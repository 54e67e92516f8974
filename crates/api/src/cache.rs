use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use extract::TextGenerator;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Memoizes completions by prompt hash. Rebuilding over unchanged chunks
/// then costs no extraction calls. Failed calls are never cached.
pub struct CachedGenerator<G> {
    inner: G,
    llm_responses: DashMap<String, String>,
    max_entries: usize,
    enabled: bool,
}

impl<G> CachedGenerator<G> {
    pub fn new(inner: G, enabled: bool, max_entries: usize) -> Self {
        Self {
            inner,
            llm_responses: DashMap::new(),
            max_entries,
            enabled,
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn set_llm_response(&self, prompt: &str, response: String) {
        if self.max_entries == 0 {
            return;
        }
        if self.llm_responses.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.llm_responses.iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.llm_responses.remove(&key);
            }
        }
        let key = hash_text(prompt);
        self.llm_responses.insert(key, response);
    }

    fn get_llm_response(&self, prompt: &str) -> Option<String> {
        let key = hash_text(prompt);
        self.llm_responses.get(&key).map(|r| r.value().clone())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            llm_responses_cached: self.llm_responses.len(),
        }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for CachedGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.enabled {
            return self.inner.generate(prompt).await;
        }

        if let Some(hit) = self.get_llm_response(prompt) {
            debug!("LLM cache hit");
            return Ok(hit);
        }

        let response = self.inner.generate(prompt).await?;
        self.set_llm_response(prompt, response.clone());
        Ok(response)
    }
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub llm_responses_cached: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for Counter {
        async fn generate(&self, prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("service down");
            }
            Ok(format!("{}#{}", prompt, n))
        }
    }

    #[tokio::test]
    async fn test_repeated_prompt_hits_cache() {
        let cached = CachedGenerator::new(Counter::default(), true, 10);

        let first = cached.generate("extract this").await.unwrap();
        let second = cached.generate("extract this").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_passes_through() {
        let cached = CachedGenerator::new(Counter::default(), false, 10);

        cached.generate("p").await.unwrap();
        cached.generate("p").await.unwrap();

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.stats().llm_responses_cached, 0);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cached = CachedGenerator::new(
            Counter {
                fail: true,
                ..Counter::default()
            },
            true,
            10,
        );

        assert!(cached.generate("p").await.is_err());
        assert!(cached.generate("p").await.is_err());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_eviction_keeps_size_bounded() {
        let cached = CachedGenerator::new(Counter::default(), true, 4);

        for i in 0..20 {
            cached.generate(&format!("prompt {}", i)).await.unwrap();
        }

        assert!(cached.stats().llm_responses_cached <= 4);
    }
}
