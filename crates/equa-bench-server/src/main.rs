#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use equa_bench_core::{ENV_EQUA_DB_PATH, ENV_EQUA_LOG_LEVEL};
use equa_bench_server::{build_router, ApiConfig, AppState};

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_env(ENV_EQUA_LOG_LEVEL)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path = PathBuf::from(
        env::var(ENV_EQUA_DB_PATH).unwrap_or_else(|_| "artifacts/equa-bench.sqlite".to_string()),
    );
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!(path = %parent.display(), error = %e, "could not create database directory");
                std::process::exit(1);
            }
        }
    }

    let api = ApiConfig {
        request_timeout: env_duration_ms("EQUA_REQUEST_TIMEOUT_MS", 10_000),
        slow_query_threshold: env_duration_ms("EQUA_SLOW_QUERY_MS", 500),
        response_max_bytes: env_usize("EQUA_RESPONSE_MAX_BYTES", 8 * 1024 * 1024),
        stats_ttl: Duration::from_secs(env_u64("EQUA_STATS_TTL_SECS", 300)),
    };

    let state = match AppState::open(&db_path, api) {
        Ok(v) => v,
        Err(e) => {
            error!(path = %db_path.display(), error = %e, "could not open analytics store");
            std::process::exit(1);
        }
    };

    let bind_addr =
        env::var("EQUA_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(v) => v,
        Err(e) => {
            error!(addr = %bind_addr, error = %e, "could not bind listener");
            std::process::exit(1);
        }
    };
    info!(addr = %bind_addr, db = %db_path.display(), "equa-bench server listening");

    let app = build_router(state);
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
