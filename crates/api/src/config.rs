use query::RetrievalConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub log_json: bool,
    pub llm: LlmConfig,
    pub vector: VectorConfig,
    pub retrieval: RetrievalConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    pub qdrant_url: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            log_json: false,
            llm: LlmConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
                embedding_model: "nomic-embed-text".to_string(),
                api_key: None,
                request_timeout_secs: 120,
            },
            vector: VectorConfig {
                qdrant_url: "http://localhost:6333".to_string(),
                collection: "graphrag_chunks".to_string(),
            },
            retrieval: RetrievalConfig::default(),
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
        }
    }
}

impl AppConfig {
    /// Load from `GRAPHRAG_*` environment variables.
    ///
    /// The service endpoints and model have no fallback: if any of them is
    /// unset the process must not start.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let mut config = Self::default();

        config.llm.base_url = require("GRAPHRAG_LLM_URL")?;
        config.llm.model = require("GRAPHRAG_LLM_MODEL")?;
        config.vector.qdrant_url = require("GRAPHRAG_QDRANT_URL")?;

        if let Some(model) = get("GRAPHRAG_EMBED_MODEL") {
            config.llm.embedding_model = model;
        }
        config.llm.api_key = get("GRAPHRAG_API_KEY");
        if let Some(collection) = get("GRAPHRAG_COLLECTION") {
            config.vector.collection = collection;
        }
        if let Some(bind) = get("GRAPHRAG_BIND") {
            config.bind_addr = bind;
        }

        override_parsed(&get, "GRAPHRAG_TIMEOUT_SECS", &mut config.llm.request_timeout_secs)?;
        override_parsed(&get, "GRAPHRAG_MAX_CONTEXT_CHARS", &mut config.retrieval.max_context_chars)?;
        override_parsed(&get, "GRAPHRAG_MIN_GRAPH_CHUNKS", &mut config.retrieval.min_graph_chunks)?;
        override_parsed(&get, "GRAPHRAG_MIN_CONTEXT_CHARS", &mut config.retrieval.min_context_chars)?;
        override_parsed(&get, "GRAPHRAG_VECTOR_TOP_K", &mut config.retrieval.vector_top_k)?;
        override_parsed(&get, "GRAPHRAG_CACHE_ENABLED", &mut config.cache.enabled)?;
        override_parsed(&get, "GRAPHRAG_CACHE_MAX_ENTRIES", &mut config.cache.max_entries)?;
        override_parsed(&get, "GRAPHRAG_LOG_JSON", &mut config.log_json)?;

        Ok(config)
    }
}

fn override_parsed<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(raw) = get(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw })?;
    }
    Ok(())
}
