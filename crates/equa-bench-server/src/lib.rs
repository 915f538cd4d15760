#![forbid(unsafe_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Mutex;

use equa_bench_analytics::{EngineConfig, QueryLimits};
use equa_bench_store::{Store, StoreError};

mod handlers;

pub const CRATE_NAME: &str = "equa-bench-server";

/// HTTP-surface configuration, environment-driven in `main`.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub request_timeout: Duration,
    pub slow_query_threshold: Duration,
    pub response_max_bytes: usize,
    pub stats_ttl: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            slow_query_threshold: Duration::from_millis(500),
            response_max_bytes: 8 * 1024 * 1024,
            stats_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
    pub api: ApiConfig,
    pub engine: EngineConfig,
    pub limits: QueryLimits,
    pub request_id_seed: Arc<AtomicU64>,
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, api: ApiConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            api,
            engine: EngineConfig::default(),
            limits: QueryLimits::default(),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn open(db_path: &Path, api: ApiConfig) -> Result<Self, StoreError> {
        Ok(Self::new(Store::open(db_path)?, api))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz_handler))
        .route("/readyz", get(handlers::readyz_handler))
        .route("/v1/version", get(handlers::version_handler))
        .route("/v1/benchmarks/:id/stats", get(handlers::stats_handler))
        .route(
            "/v1/benchmarks/:id/stats/grouped",
            get(handlers::grouped_stats_handler),
        )
        .route(
            "/v1/benchmarks/:id/top-performers",
            get(handlers::top_performers_handler),
        )
        .route(
            "/v1/benchmarks/finalize-upload",
            post(handlers::finalize_upload_handler),
        )
        .with_state(state)
}
