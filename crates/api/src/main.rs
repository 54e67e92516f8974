mod cache;
mod config;
mod metrics;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use extract::{OllamaClient, TextGenerator, TripleExtractor};
use index::{
    BuildReport, ChunkIndex, Edge, EmbeddingClient, GraphBuilder, GraphError, GraphStats,
    KnowledgeGraph, QdrantIndexer,
};
use ingest::Chunk;
use query::{Answer, GraphRagEngine, QueryError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cache::{CacheStats, CachedGenerator};
use config::AppConfig;
use metrics::{Metrics, MetricsSnapshot};

type Llm = Arc<CachedGenerator<OllamaClient>>;

struct AppState {
    llm: Llm,
    vectors: Arc<QdrantIndexer>,
    engine: GraphRagEngine<Llm, Arc<QdrantIndexer>>,
    /// One session: queries and rebuilds take turns on this lock
    session: Mutex<Session>,
    metrics: Arc<Metrics>,
}

#[derive(Default)]
struct Session {
    graph: Option<KnowledgeGraph>,
    last_build: Option<BuildReport>,
}

impl Session {
    /// Swap the vector index, then build a fresh graph over the same chunks.
    /// The new graph replaces the old one only once it is complete. If the
    /// vector swap fails, the old graph is dropped as well, since the
    /// collection may no longer match it.
    async fn rebuild<G, V>(&mut self, chunks: &[Chunk], llm: G, vectors: &V) -> Result<(GraphStats, BuildReport)>
    where
        G: TextGenerator,
        V: ChunkIndex + ?Sized,
    {
        if let Err(e) = vectors.replace_chunks(chunks).await {
            self.graph = None;
            self.last_build = None;
            return Err(e);
        }

        let builder = GraphBuilder::new(TripleExtractor::new(llm));
        let (graph, report) = builder.build_with_report(chunks).await;

        let stats = graph.stats();
        self.graph = Some(graph);
        self.last_build = Some(report.clone());

        Ok((stats, report))
    }
}

/// Error surfaced to the client verbatim
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn no_graph() -> Self {
        Self::new(StatusCode::CONFLICT, "No graph built yet. POST /build first.")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    llm: String,
    qdrant: String,
}

#[derive(Deserialize)]
struct BuildRequest {
    path: String,
}

#[derive(Serialize)]
struct BuildResponse {
    graph: GraphStats,
    report: BuildReport,
}

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Serialize)]
struct QueryResponse {
    #[serde(flatten)]
    answer: Answer,
    /// `subject --RELATION--> object` lines for display
    reasoning: Vec<String>,
}

#[derive(Serialize)]
struct StatsResponse {
    graph: GraphStats,
    last_build: Option<BuildReport>,
    cache: CacheStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env; real environment wins
    let _ = dotenvy::dotenv();

    // Refuse to start without the service endpoints
    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_json);

    let ollama = OllamaClient::new(config.llm.base_url.clone(), config.llm.model.clone())
        .with_api_key(config.llm.api_key.clone())
        .with_timeout(Duration::from_secs(config.llm.request_timeout_secs))?;
    let llm: Llm = Arc::new(CachedGenerator::new(
        ollama,
        config.cache.enabled,
        config.cache.max_entries,
    ));

    let embedding_client = EmbeddingClient::new(
        config.llm.base_url.clone(),
        config.llm.embedding_model.clone(),
    )
    .with_api_key(config.llm.api_key.clone());
    let vectors = Arc::new(QdrantIndexer::new(
        config.vector.qdrant_url.clone(),
        embedding_client,
        config.vector.collection.clone(),
    ));

    let engine = GraphRagEngine::new(llm.clone(), vectors.clone(), config.retrieval);
    let bind_addr = config.bind_addr.clone();

    info!(
        model = %config.llm.model,
        embedding_model = %config.llm.embedding_model,
        collection = %config.vector.collection,
        "Configuration loaded"
    );

    let state = Arc::new(AppState {
        llm,
        vectors,
        engine,
        session: Mutex::new(Session::default()),
        metrics: Metrics::new(),
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/build", post(build_graph))
        .route("/query", post(answer_question))
        .route("/stats", get(get_stats))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let llm_status = match state.llm.inner().ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {:#}", e),
    };

    let qdrant_status = match state.vectors.ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        llm: llm_status,
        qdrant: qdrant_status,
    })
}

async fn build_graph(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BuildRequest>,
) -> Result<Json<BuildResponse>, ApiError> {
    let path = PathBuf::from(&req.path);
    if !path.exists() {
        return Err(ApiError::new(StatusCode::NOT_FOUND, format!("Path not found: {}", req.path)));
    }

    let mut session = state.session.lock().await;

    let chunks = ingest::ingest_path(&path)
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("{:#}", e)))?;

    let (stats, report) = session
        .rebuild(&chunks, state.llm.clone(), state.vectors.as_ref())
        .await
        .map_err(upstream_error)?;

    state
        .metrics
        .record_build(report.elapsed, report.chunks_processed, report.triples_accepted);

    Ok(Json(BuildResponse { graph: stats, report }))
}

async fn answer_question(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let session = state.session.lock().await;
    let graph = session.graph.as_ref().ok_or_else(ApiError::no_graph)?;

    let start = Instant::now();
    let result = state.engine.answer(graph, &req.question).await;

    match result {
        Ok(answer) => {
            state
                .metrics
                .record_query(start.elapsed(), true, Some(answer.retrieval.used_vector_fallback));
            let reasoning = answer.retrieval.reasoning_path.iter().map(Edge::to_string).collect();
            Ok(Json(QueryResponse { answer, reasoning }))
        }
        Err(e) => {
            state.metrics.record_query(start.elapsed(), false, None);
            if let Some(query_error) = e.downcast_ref::<QueryError>() {
                return Err(ApiError::new(StatusCode::BAD_REQUEST, query_error.to_string()));
            }
            if let Some(graph_error) = e.downcast_ref::<GraphError>() {
                error!(error = %graph_error, "Graph invariant violated");
                return Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, graph_error.to_string()));
            }
            Err(upstream_error(e))
        }
    }
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let session = state.session.lock().await;
    let graph = session.graph.as_ref().ok_or_else(ApiError::no_graph)?;

    Ok(Json(StatsResponse {
        graph: graph.stats(),
        last_build: session.last_build.clone(),
        cache: state.llm.stats(),
    }))
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

fn upstream_error(e: anyhow::Error) -> ApiError {
    error!(error = %format!("{:#}", e), "Request failed");
    ApiError::new(StatusCode::BAD_GATEWAY, format!("{:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct OneTriple;

    #[async_trait]
    impl TextGenerator for OneTriple {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(r#"[{"subject": "Volcano", "relation": "CAUSES", "object": "Ash"}]"#.to_string())
        }
    }

    struct CountingLlm(AtomicUsize);

    #[async_trait]
    impl TextGenerator for CountingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("[]".to_string())
        }
    }

    struct Vectors {
        fail: bool,
    }

    #[async_trait]
    impl ChunkIndex for Vectors {
        async fn replace_chunks(&self, _chunks: &[Chunk]) -> Result<()> {
            if self.fail {
                anyhow::bail!("Failed to embed chunk 1");
            }
            Ok(())
        }
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("Volcanoes erupt and produce ash.", "volcanoes.txt", None),
            Chunk::new("Ash can ground aircraft.", "volcanoes.txt", None),
        ]
    }

    #[tokio::test]
    async fn test_rebuild_replaces_graph() {
        let mut session = Session::default();

        let (stats, report) = session
            .rebuild(&chunks(), OneTriple, &Vectors { fail: false })
            .await
            .unwrap();

        assert_eq!(report.chunks_processed, 2);
        assert_eq!(report.triples_accepted, 2);
        assert_eq!(stats, session.graph.as_ref().unwrap().stats());
        assert!(session.graph.as_ref().unwrap().contains("Volcano"));
        assert!(session.last_build.is_some());
    }

    #[tokio::test]
    async fn test_failed_vector_swap_discards_previous_graph() {
        let mut session = Session::default();
        session
            .rebuild(&chunks(), OneTriple, &Vectors { fail: false })
            .await
            .unwrap();

        let llm = CountingLlm(AtomicUsize::new(0));
        let err = session
            .rebuild(&chunks(), &llm, &Vectors { fail: true })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to embed chunk 1"));
        assert!(session.graph.is_none());
        assert!(session.last_build.is_none());
        // No extraction runs once the vector side has failed
        assert_eq!(llm.0.load(Ordering::SeqCst), 0);
    }
}
