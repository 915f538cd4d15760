use std::net::SocketAddr;

use equa_bench_model::{
    Benchmark, BenchmarkId, BenchmarkStatus, DataPoint, Dimension, JobId, JobStatus, MetricKey,
    UploadJob,
};
use equa_bench_server::{build_router, ApiConfig, AppState};
use equa_bench_store::{unix_now, Store};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn seeded_state() -> AppState {
    let mut store = Store::open_in_memory().expect("open store");
    let bm = BenchmarkId::parse("bm-1").expect("benchmark id");
    store
        .create_benchmark(&Benchmark {
            id: bm.clone(),
            name: "2026 global".to_string(),
            status: BenchmarkStatus::Pending,
            rows_declared: 10,
            rows_processed: 0,
            created_at: unix_now(),
            processed_at: None,
        })
        .expect("create benchmark");
    store
        .create_job(&UploadJob {
            id: JobId::parse("job-1").expect("job id"),
            benchmark_id: bm.clone(),
            status: JobStatus::Pending,
            progress: 0,
            current_phase: None,
            rows_declared: 10,
            rows_processed: 0,
            error_message: None,
            updated_at: unix_now(),
        })
        .expect("create job");

    // Region a: 7 records, region b: 3 records (scenario C shape).
    let mut points = Vec::new();
    for i in 0..7 {
        points.push(
            DataPoint::new(format!("a{i}"), bm.clone())
                .with_dimension(Dimension::Region, "a")
                .with_metric(MetricKey::TotalEq, 60.0 + f64::from(i))
                .with_metric(MetricKey::Effectiveness, 50.0 + f64::from(i)),
        );
    }
    for i in 0..3 {
        points.push(
            DataPoint::new(format!("b{i}"), bm.clone())
                .with_dimension(Dimension::Region, "b")
                .with_metric(MetricKey::TotalEq, 80.0 + f64::from(i)),
        );
    }
    store.insert_data_points(&points).expect("insert points");
    AppState::new(store, ApiConfig::default())
}

async fn spawn_server(state: AppState) -> SocketAddr {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n");
    if let Some(body) = body {
        req.push_str("content-type: application/json\r\n");
        req.push_str(&format!("content-length: {}\r\n", body.len()));
        req.push_str("\r\n");
        req.push_str(body);
    } else {
        req.push_str("\r\n");
    }
    stream.write_all(req.as_bytes()).await.expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, body.to_string())
}

async fn get_json(addr: SocketAddr, path: &str) -> (u16, Value) {
    let (status, body) = send_raw(addr, "GET", path, None).await;
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn version_and_health_endpoints() {
    let addr = spawn_server(seeded_state()).await;
    let (status, body) = send_raw(addr, "GET", "/healthz", None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
    let (status, json) = get_json(addr, "/v1/version").await;
    assert_eq!(status, 200);
    assert_eq!(json.get("name").and_then(Value::as_str), Some("equa-bench"));
}

#[tokio::test]
async fn stats_endpoint_live_compute_and_filtering() {
    let addr = spawn_server(seeded_state()).await;

    let (status, json) = get_json(addr, "/v1/benchmarks/bm-1/stats").await;
    assert_eq!(status, 200);
    assert_eq!(json.get("filtered").and_then(Value::as_bool), Some(false));
    assert_eq!(json.get("total").and_then(Value::as_u64), Some(10));
    let statistics = json
        .get("statistics")
        .and_then(Value::as_array)
        .expect("statistics array");
    assert_eq!(statistics.len(), 2, "total_eq and effectiveness only");
    assert_eq!(
        statistics[0].get("metric").and_then(Value::as_str),
        Some("total_eq"),
        "registry order"
    );

    let (status, json) = get_json(addr, "/v1/benchmarks/bm-1/stats?region=b").await;
    assert_eq!(status, 200);
    assert_eq!(json.get("filtered").and_then(Value::as_bool), Some(true));
    assert_eq!(json.get("total").and_then(Value::as_u64), Some(3));
}

#[tokio::test]
async fn stats_endpoint_rejects_unknown_dimension_and_benchmark() {
    let addr = spawn_server(seeded_state()).await;

    let (status, json) = get_json(addr, "/v1/benchmarks/bm-1/stats?tenure=5y").await;
    assert_eq!(status, 400);
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("UnknownDimension")
    );

    let (status, json) = get_json(addr, "/v1/benchmarks/bm-404/stats").await;
    assert_eq!(status, 404);
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("UnknownBenchmark")
    );
}

#[tokio::test]
async fn grouped_endpoint_matches_scenario_c() {
    let addr = spawn_server(seeded_state()).await;

    let (status, json) =
        get_json(addr, "/v1/benchmarks/bm-1/stats/grouped?group_by=region").await;
    assert_eq!(status, 200);
    assert_eq!(json.get("group_by").and_then(Value::as_str), Some("region"));
    assert_eq!(json.get("total_groups").and_then(Value::as_u64), Some(2));
    assert_eq!(json.get("total_records").and_then(Value::as_u64), Some(10));
    let groups = json.get("groups").and_then(Value::as_array).expect("groups");
    assert_eq!(groups[0].get("value").and_then(Value::as_str), Some("a"));
    assert_eq!(groups[0].get("count").and_then(Value::as_u64), Some(7));
    assert_eq!(groups[1].get("value").and_then(Value::as_str), Some("b"));

    let (status, json) =
        get_json(addr, "/v1/benchmarks/bm-1/stats/grouped?group_by=height").await;
    assert_eq!(status, 400);
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("UnknownDimension")
    );
}

#[tokio::test]
async fn top_performers_before_finalize_is_empty_after_finalize_enriched() {
    let addr = spawn_server(seeded_state()).await;

    let (status, json) = get_json(
        addr,
        "/v1/benchmarks/bm-1/top-performers?outcome=effectiveness",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json.get("total").and_then(Value::as_u64), Some(0));
    assert_eq!(
        json.get("fallback_used").and_then(Value::as_bool),
        Some(false)
    );

    let (status, json) = send_finalize(addr, "bm-1", "job-1").await;
    assert_eq!(status, 200);
    assert_eq!(json.get("status").and_then(Value::as_str), Some("completed"));

    let (status, json) = get_json(
        addr,
        "/v1/benchmarks/bm-1/top-performers?outcome=effectiveness",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json.get("total").and_then(Value::as_u64), Some(1));
    let profile = &json.get("top_performers").and_then(Value::as_array).expect("profiles")[0];
    assert!(profile.get("confidence_level").is_some());
    assert!(profile.get("approx_effect_proxy_competencies").is_some());

    // A filter scope with no stored profile falls back to global.
    let (status, json) = get_json(
        addr,
        "/v1/benchmarks/bm-1/top-performers?outcome=effectiveness&region=a",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json.get("fallback_used").and_then(Value::as_bool), Some(true));
}

async fn send_finalize(addr: SocketAddr, bm: &str, job: &str) -> (u16, Value) {
    let body = format!(r#"{{"benchmark_id":"{bm}","job_id":"{job}"}}"#);
    let (status, body) = send_raw(addr, "POST", "/v1/benchmarks/finalize-upload", Some(&body)).await;
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn finalize_zero_rows_reports_failure_scenario_b() {
    let store = Store::open_in_memory().expect("open store");
    let bm = BenchmarkId::parse("bm-empty").expect("benchmark id");
    store
        .create_benchmark(&Benchmark {
            id: bm.clone(),
            name: "empty".to_string(),
            status: BenchmarkStatus::Pending,
            rows_declared: 0,
            rows_processed: 0,
            created_at: unix_now(),
            processed_at: None,
        })
        .expect("create benchmark");
    store
        .create_job(&UploadJob {
            id: JobId::parse("job-empty").expect("job id"),
            benchmark_id: bm,
            status: JobStatus::Pending,
            progress: 0,
            current_phase: None,
            rows_declared: 0,
            rows_processed: 0,
            error_message: None,
            updated_at: unix_now(),
        })
        .expect("create job");
    let state = AppState::new(store, ApiConfig::default());
    let addr = spawn_server(state.clone()).await;

    let (status, json) = send_finalize(addr, "bm-empty", "job-empty").await;
    assert_eq!(status, 200, "failure is a well-formed response");
    assert_eq!(json.get("status").and_then(Value::as_str), Some("failed"));
    assert!(json
        .get("error")
        .and_then(Value::as_str)
        .expect("error message")
        .contains("no data points"));

    let store = state.store.lock().await;
    let benchmark = store
        .get_benchmark(&BenchmarkId::parse("bm-empty").expect("id"))
        .expect("get")
        .expect("exists");
    assert_eq!(benchmark.status, BenchmarkStatus::Failed);
    assert!(store
        .read_statistics(&benchmark.id, "")
        .expect("read")
        .is_empty());
}

#[tokio::test]
async fn finalize_unknown_job_is_not_found() {
    let addr = spawn_server(seeded_state()).await;
    let (status, json) = send_finalize(addr, "bm-1", "job-ghost").await;
    assert_eq!(status, 404);
    assert_eq!(
        json.pointer("/error/code").and_then(Value::as_str),
        Some("UnknownJob")
    );
}

#[tokio::test]
async fn stats_served_from_cache_after_finalize() {
    let state = seeded_state();
    let addr = spawn_server(state.clone()).await;
    let (status, _) = send_finalize(addr, "bm-1", "job-1").await;
    assert_eq!(status, 200);

    {
        let store = state.store.lock().await;
        let rows = store
            .read_statistics(&BenchmarkId::parse("bm-1").expect("id"), "")
            .expect("read");
        assert!(!rows.is_empty(), "finalize populated the cache");
    }

    let (status, json) = get_json(addr, "/v1/benchmarks/bm-1/stats").await;
    assert_eq!(status, 200);
    let statistics = json
        .get("statistics")
        .and_then(Value::as_array)
        .expect("statistics");
    assert_eq!(statistics.len(), 2);
    for s in statistics {
        let p10 = s.get("p10").and_then(Value::as_f64).expect("p10");
        let p95 = s.get("p95").and_then(Value::as_f64).expect("p95");
        assert!(p10 <= p95, "monotonic percentiles over the wire");
    }
}
