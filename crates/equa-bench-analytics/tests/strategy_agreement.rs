//! The storage-side (native aggregate) and in-memory strategies must agree
//! on every statistic for the same unfiltered population, for both
//! percentile methods.

use equa_bench_analytics::native_descriptive;
use equa_bench_model::{
    Benchmark, BenchmarkId, BenchmarkStatus, DataPoint, DimensionFilter, MetricKey,
};
use equa_bench_stats::{compute_descriptive, PercentileMethod};
use equa_bench_store::{unix_now, Store};
use proptest::prelude::*;

fn seeded_store(values: &[f64]) -> (Store, BenchmarkId) {
    let mut store = Store::open_in_memory().expect("open store");
    let bm = BenchmarkId::parse("bm-agree").expect("benchmark id");
    store
        .create_benchmark(&Benchmark {
            id: bm.clone(),
            name: "agreement".to_string(),
            status: BenchmarkStatus::Pending,
            rows_declared: values.len() as u64,
            rows_processed: 0,
            created_at: unix_now(),
            processed_at: None,
        })
        .expect("create benchmark");
    let points: Vec<DataPoint> = values
        .iter()
        .enumerate()
        .map(|(i, v)| DataPoint::new(format!("p{i}"), bm.clone()).with_metric(MetricKey::TotalEq, *v))
        .collect();
    store.insert_data_points(&points).expect("insert points");
    (store, bm)
}

fn assert_close(a: f64, b: f64, what: &str) {
    let scale = a.abs().max(b.abs()).max(1.0);
    assert!(
        (a - b).abs() <= 1e-6 * scale,
        "{what}: native={a} in_memory={b}"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn strategies_agree_on_unfiltered_population(
        values in prop::collection::vec(0.0f64..150.0, 1..120),
        use_linear in any::<bool>(),
    ) {
        let method = if use_linear {
            PercentileMethod::Linear
        } else {
            PercentileMethod::NearestRank
        };
        let (store, bm) = seeded_store(&values);

        let native = native_descriptive(&store, &bm, MetricKey::TotalEq, method)
            .expect("native strategy")
            .expect("population is non-empty");
        let loaded = store
            .load_metric_values(&bm, MetricKey::TotalEq, &DimensionFilter::new(), values.len() + 1)
            .expect("load values");
        let in_memory = compute_descriptive(&loaded, method).expect("population is non-empty");

        prop_assert_eq!(native.n, in_memory.n);
        assert_close(native.mean, in_memory.mean, "mean");
        assert_close(native.std_dev, in_memory.std_dev, "std_dev");
        assert_close(native.min, in_memory.min, "min");
        assert_close(native.max, in_memory.max, "max");
        assert_close(native.p10, in_memory.p10, "p10");
        assert_close(native.p25, in_memory.p25, "p25");
        assert_close(native.p50, in_memory.p50, "p50");
        assert_close(native.p75, in_memory.p75, "p75");
        assert_close(native.p90, in_memory.p90, "p90");
        assert_close(native.p95, in_memory.p95, "p95");
        assert_close(native.median, in_memory.median, "median");
    }

    #[test]
    fn percentiles_are_monotonic_under_both_methods(
        values in prop::collection::vec(0.0f64..150.0, 1..120),
        use_linear in any::<bool>(),
    ) {
        let method = if use_linear {
            PercentileMethod::Linear
        } else {
            PercentileMethod::NearestRank
        };
        let d = compute_descriptive(&values, method).expect("population is non-empty");
        let ps = [d.p10, d.p25, d.p50, d.p75, d.p90, d.p95];
        prop_assert!(ps.windows(2).all(|w| w[0] <= w[1]), "percentiles: {:?}", ps);
    }
}
