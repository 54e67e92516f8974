use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

pub struct Metrics {
    // Counters
    total_builds: AtomicUsize,
    total_queries: AtomicUsize,
    successful_queries: AtomicUsize,
    failed_queries: AtomicUsize,
    vector_fallbacks: AtomicUsize,

    // Timing (in microseconds)
    total_build_time_us: AtomicU64,
    total_query_time_us: AtomicU64,

    // Counts
    total_chunks_processed: AtomicUsize,
    total_triples_extracted: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_builds: AtomicUsize::new(0),
            total_queries: AtomicUsize::new(0),
            successful_queries: AtomicUsize::new(0),
            failed_queries: AtomicUsize::new(0),
            vector_fallbacks: AtomicUsize::new(0),
            total_build_time_us: AtomicU64::new(0),
            total_query_time_us: AtomicU64::new(0),
            total_chunks_processed: AtomicUsize::new(0),
            total_triples_extracted: AtomicUsize::new(0),
        })
    }

    pub fn record_build(&self, duration: Duration, chunks: usize, triples: usize) {
        self.total_builds.fetch_add(1, Ordering::Relaxed);
        self.total_build_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_chunks_processed.fetch_add(chunks, Ordering::Relaxed);
        self.total_triples_extracted.fetch_add(triples, Ordering::Relaxed);
    }

    /// `used_fallback` is `None` when the query failed before the hybrid gate.
    pub fn record_query(&self, duration: Duration, success: bool, used_fallback: Option<bool>) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.total_query_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if success {
            self.successful_queries.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }
        if used_fallback == Some(true) {
            self.vector_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_builds: self.total_builds.load(Ordering::Relaxed),
            total_queries: self.total_queries.load(Ordering::Relaxed),
            successful_queries: self.successful_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            vector_fallbacks: self.vector_fallbacks.load(Ordering::Relaxed),
            avg_build_time_ms: avg_time_ms(&self.total_build_time_us, &self.total_builds),
            avg_query_time_ms: avg_time_ms(&self.total_query_time_us, &self.total_queries),
            total_chunks_processed: self.total_chunks_processed.load(Ordering::Relaxed),
            total_triples_extracted: self.total_triples_extracted.load(Ordering::Relaxed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_builds: usize,
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub vector_fallbacks: usize,
    pub avg_build_time_ms: f64,
    pub avg_query_time_ms: f64,
    pub total_chunks_processed: usize,
    pub total_triples_extracted: usize,
}
