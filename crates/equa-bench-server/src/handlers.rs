use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{info, warn};

use equa_bench_analytics::{
    compute_grouped, get_statistics, get_top_performers, AnalyticsError,
};
use equa_bench_api::params::{
    parse_benchmark_id, parse_finalize_body, parse_grouped_params, parse_stats_params,
    parse_top_performer_params,
};
use equa_bench_api::{ApiError, ApiErrorCode, FinalizeAccepted, FinalizeRejected};
use equa_bench_core::sha256_hex;
use equa_bench_model::{BenchmarkId, JobStatus};
use equa_bench_pipeline::run_finalize;

use crate::AppState;

fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({"error": err}))).into_response()
}

fn analytics_error_response(err: &AnalyticsError) -> Response {
    match err {
        AnalyticsError::Validation(msg) => api_error_response(
            StatusCode::BAD_REQUEST,
            ApiError::new(
                ApiErrorCode::InvalidQueryParameter,
                "invalid request",
                json!({"message": msg}),
            ),
        ),
        AnalyticsError::Policy(msg) => api_error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new(
                ApiErrorCode::QueryRejectedByPolicy,
                "query rejected",
                json!({"message": msg}),
            ),
        ),
        AnalyticsError::Store(msg) => api_error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new(
                ApiErrorCode::Internal,
                "query failed",
                json!({"message": msg}),
            ),
        ),
    }
}

fn timeout_response() -> Response {
    api_error_response(
        StatusCode::GATEWAY_TIMEOUT,
        ApiError::new(ApiErrorCode::Timeout, "request timed out", json!({})),
    )
}

fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string)
}

fn put_cache_headers(headers: &mut HeaderMap, ttl: Duration, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert("cache-control", value);
    }
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert("etag", value);
    }
}

fn to_sorted(params: &HashMap<String, String>) -> BTreeMap<String, String> {
    params.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

async fn resolve_benchmark(
    state: &AppState,
    raw_id: &str,
) -> Result<BenchmarkId, Response> {
    let id = parse_benchmark_id(raw_id)
        .map_err(|e| api_error_response(StatusCode::BAD_REQUEST, e))?;
    let known = {
        let store = state.store.lock().await;
        store
            .get_benchmark(&id)
            .map_err(|e| {
                api_error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiError::new(
                        ApiErrorCode::Internal,
                        "store unavailable",
                        json!({"message": e.to_string()}),
                    ),
                )
            })?
            .is_some()
    };
    if !known {
        return Err(api_error_response(
            StatusCode::NOT_FOUND,
            ApiError::unknown_benchmark(raw_id),
        ));
    }
    Ok(id)
}

/// Serialize a payload, enforce the size guard, and attach cache headers.
fn json_response_with_cache<T: serde::Serialize>(
    state: &AppState,
    headers: &HeaderMap,
    payload: &T,
) -> Response {
    let bytes = match serde_json::to_vec(payload) {
        Ok(b) => b,
        Err(e) => {
            return api_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(
                    ApiErrorCode::Internal,
                    "serialization failed",
                    json!({"message": e.to_string()}),
                ),
            )
        }
    };
    if bytes.len() > state.api.response_max_bytes {
        return api_error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::new(
                ApiErrorCode::QueryRejectedByPolicy,
                "response exceeds configured size guard",
                json!({"bytes": bytes.len(), "max": state.api.response_max_bytes}),
            ),
        );
    }
    let etag = format!("\"{}\"", sha256_hex(&bytes));
    if if_none_match(headers).as_deref() == Some(etag.as_str()) {
        let mut resp = StatusCode::NOT_MODIFIED.into_response();
        put_cache_headers(resp.headers_mut(), state.api.stats_ttl, &etag);
        return resp;
    }
    let mut resp = (
        StatusCode::OK,
        [("content-type", "application/json")],
        bytes,
    )
        .into_response();
    put_cache_headers(resp.headers_mut(), state.api.stats_ttl, &etag);
    resp
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.ready.load(Ordering::Relaxed) {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not-ready")
    }
}

pub(crate) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": "equa-bench",
        "crate": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) async fn stats_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    info!(request_id = %request_id, route = "/v1/benchmarks/:id/stats", "request start");

    let parsed = match parse_stats_params(&to_sorted(&params)) {
        Ok(v) => v,
        Err(e) => {
            return with_request_id(api_error_response(StatusCode::BAD_REQUEST, e), &request_id)
        }
    };
    let benchmark = match resolve_benchmark(&state, &raw_id).await {
        Ok(v) => v,
        Err(resp) => return with_request_id(resp, &request_id),
    };

    let work = async {
        let store = state.store.lock().await;
        get_statistics(&store, &benchmark, &parsed.filter, state.engine, state.limits)
    };
    let response = match timeout(state.api.request_timeout, work).await {
        Ok(Ok(report)) => json_response_with_cache(&state, &headers, &report),
        Ok(Err(err)) => analytics_error_response(&err),
        Err(_) => timeout_response(),
    };
    if started.elapsed() > state.api.slow_query_threshold {
        warn!(request_id = %request_id, elapsed_ms = started.elapsed().as_millis() as u64, "slow statistics query");
    }
    info!(request_id = %request_id, "request complete");
    with_request_id(response, &request_id)
}

pub(crate) async fn grouped_stats_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    info!(request_id = %request_id, route = "/v1/benchmarks/:id/stats/grouped", "request start");

    let parsed = match parse_grouped_params(&to_sorted(&params)) {
        Ok(v) => v,
        Err(e) => {
            return with_request_id(api_error_response(StatusCode::BAD_REQUEST, e), &request_id)
        }
    };
    let benchmark = match resolve_benchmark(&state, &raw_id).await {
        Ok(v) => v,
        Err(resp) => return with_request_id(resp, &request_id),
    };

    let work = async {
        let store = state.store.lock().await;
        compute_grouped(
            &store,
            &benchmark,
            parsed.group_by,
            &parsed.filter,
            state.engine,
            state.limits,
        )
    };
    let response = match timeout(state.api.request_timeout, work).await {
        Ok(Ok(report)) => json_response_with_cache(&state, &headers, &report),
        Ok(Err(err)) => analytics_error_response(&err),
        Err(_) => timeout_response(),
    };
    if started.elapsed() > state.api.slow_query_threshold {
        warn!(request_id = %request_id, elapsed_ms = started.elapsed().as_millis() as u64, "slow grouped query");
    }
    with_request_id(response, &request_id)
}

pub(crate) async fn top_performers_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    info!(request_id = %request_id, route = "/v1/benchmarks/:id/top-performers", "request start");

    let parsed = match parse_top_performer_params(&to_sorted(&params)) {
        Ok(v) => v,
        Err(e) => {
            return with_request_id(api_error_response(StatusCode::BAD_REQUEST, e), &request_id)
        }
    };
    let benchmark = match resolve_benchmark(&state, &raw_id).await {
        Ok(v) => v,
        Err(resp) => return with_request_id(resp, &request_id),
    };

    let work = async {
        let store = state.store.lock().await;
        get_top_performers(&store, &benchmark, parsed.outcome, &parsed.filter)
    };
    let response = match timeout(state.api.request_timeout, work).await {
        Ok(Ok(report)) => json_response_with_cache(&state, &headers, &report),
        Ok(Err(err)) => analytics_error_response(&err),
        Err(_) => timeout_response(),
    };
    with_request_id(response, &request_id)
}

/// Trigger the finalize pipeline for one upload job.
///
/// Structural problems (bad body, unknown identifiers) are non-200. A run
/// that starts and fails reports the failure in a well-formed body; the job
/// row carries the same error message. Calling this twice concurrently for
/// the same job is the caller's responsibility to avoid.
pub(crate) async fn finalize_upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    info!(request_id = %request_id, route = "/v1/benchmarks/finalize-upload", "request start");

    let parsed = match parse_finalize_body(&body) {
        Ok(v) => v,
        Err(e) => {
            return with_request_id(api_error_response(StatusCode::BAD_REQUEST, e), &request_id)
        }
    };

    // Existence is checked up front so a not-found stays side-effect free.
    {
        let store = state.store.lock().await;
        match store.get_benchmark(&parsed.benchmark_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return with_request_id(
                    api_error_response(
                        StatusCode::NOT_FOUND,
                        ApiError::unknown_benchmark(parsed.benchmark_id.as_str()),
                    ),
                    &request_id,
                )
            }
            Err(e) => {
                return with_request_id(
                    api_error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        ApiError::new(
                            ApiErrorCode::Internal,
                            "store unavailable",
                            json!({"message": e.to_string()}),
                        ),
                    ),
                    &request_id,
                )
            }
        }
        match store.get_job(&parsed.job_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return with_request_id(
                    api_error_response(
                        StatusCode::NOT_FOUND,
                        ApiError::unknown_job(parsed.job_id.as_str()),
                    ),
                    &request_id,
                )
            }
            Err(e) => {
                return with_request_id(
                    api_error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        ApiError::new(
                            ApiErrorCode::Internal,
                            "store unavailable",
                            json!({"message": e.to_string()}),
                        ),
                    ),
                    &request_id,
                )
            }
        }
    }

    let mut store = state.store.lock().await;
    let response = match run_finalize(
        &mut store,
        &parsed.benchmark_id,
        &parsed.job_id,
        state.engine,
    ) {
        Ok(outcome) => Json(FinalizeAccepted {
            job_id: outcome.job_id,
            status: JobStatus::Completed.as_str().to_string(),
            rows_processed: outcome.rows_processed,
            statistics_written: outcome.statistics_written,
            profiles_written: outcome.profiles_written,
        })
        .into_response(),
        Err(err) => Json(FinalizeRejected {
            job_id: parsed.job_id,
            status: JobStatus::Failed.as_str().to_string(),
            error: err.0,
        })
        .into_response(),
    };
    with_request_id(response, &request_id)
}
