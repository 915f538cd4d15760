use equa_bench_analytics::{compute_grouped, EngineConfig, QueryLimits};
use equa_bench_model::{
    Benchmark, BenchmarkId, BenchmarkStatus, DataPoint, Dimension, DimensionFilter, MetricKey,
};
use equa_bench_store::{unix_now, Store};

fn seed_regions() -> (Store, BenchmarkId) {
    let mut store = Store::open_in_memory().expect("open store");
    let bm = BenchmarkId::parse("bm-1").expect("benchmark id");
    store
        .create_benchmark(&Benchmark {
            id: bm.clone(),
            name: "regions".to_string(),
            status: BenchmarkStatus::Pending,
            rows_declared: 10,
            rows_processed: 0,
            created_at: unix_now(),
            processed_at: None,
        })
        .expect("create benchmark");

    // Region A: 7 records, region B: 3 records.
    let mut points = Vec::new();
    for i in 0..7 {
        points.push(
            DataPoint::new(format!("a{i}"), bm.clone())
                .with_dimension(Dimension::Region, "a")
                .with_dimension(Dimension::CognitiveStyle, if i % 2 == 0 { "analytical" } else { "intuitive" })
                .with_metric(MetricKey::TotalEq, 60.0 + f64::from(i)),
        );
    }
    for i in 0..3 {
        points.push(
            DataPoint::new(format!("b{i}"), bm.clone())
                .with_dimension(Dimension::Region, "b")
                .with_dimension(Dimension::CognitiveStyle, "analytical")
                .with_metric(MetricKey::TotalEq, 80.0 + f64::from(i)),
        );
    }
    store.insert_data_points(&points).expect("insert points");
    (store, bm)
}

#[test]
fn groups_sorted_by_count_with_totals() {
    let (store, bm) = seed_regions();
    let report = compute_grouped(
        &store,
        &bm,
        Dimension::Region,
        &DimensionFilter::new(),
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");

    assert_eq!(report.group_by, Dimension::Region);
    assert_eq!(report.total_groups, 2);
    assert_eq!(report.total_records, 10);
    assert_eq!(report.groups[0].value, "a");
    assert_eq!(report.groups[0].count, 7);
    assert_eq!(report.groups[1].value, "b");
    assert_eq!(report.groups[1].count, 3);
}

#[test]
fn group_count_sum_matches_non_null_population() {
    let (mut store, bm) = seed_regions();
    // A record without a region joins no group.
    store
        .insert_data_points(&[DataPoint::new("x0", bm.clone())
            .with_metric(MetricKey::TotalEq, 10.0)])
        .expect("insert point");
    let report = compute_grouped(
        &store,
        &bm,
        Dimension::Region,
        &DimensionFilter::new(),
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");
    assert_eq!(report.total_records, 10, "regionless record is excluded");
}

#[test]
fn ties_break_lexically_by_group_value() {
    let mut store = Store::open_in_memory().expect("open store");
    let bm = BenchmarkId::parse("bm-1").expect("benchmark id");
    store
        .create_benchmark(&Benchmark {
            id: bm.clone(),
            name: "ties".to_string(),
            status: BenchmarkStatus::Pending,
            rows_declared: 4,
            rows_processed: 0,
            created_at: unix_now(),
            processed_at: None,
        })
        .expect("create benchmark");
    let mut points = Vec::new();
    for (i, region) in ["delta", "delta", "alpha", "alpha"].iter().enumerate() {
        points.push(
            DataPoint::new(format!("p{i}"), bm.clone())
                .with_dimension(Dimension::Region, *region),
        );
    }
    store.insert_data_points(&points).expect("insert points");
    let report = compute_grouped(
        &store,
        &bm,
        Dimension::Region,
        &DimensionFilter::new(),
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");
    let values: Vec<&str> = report.groups.iter().map(|g| g.value.as_str()).collect();
    assert_eq!(values, vec!["alpha", "delta"]);
}

#[test]
fn extra_filter_on_group_dimension_is_dropped() {
    let (store, bm) = seed_regions();
    // A contradictory region filter must not empty the groups.
    let extra = DimensionFilter::new().with(Dimension::Region, "b");
    let report = compute_grouped(
        &store,
        &bm,
        Dimension::Region,
        &extra,
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");
    assert_eq!(report.total_groups, 2, "both regions appear despite region filter");
}

#[test]
fn cognitive_style_histogram_attached_except_when_grouping_by_it() {
    let (store, bm) = seed_regions();
    let by_region = compute_grouped(
        &store,
        &bm,
        Dimension::Region,
        &DimensionFilter::new(),
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");
    let a = &by_region.groups[0];
    let histogram = a
        .cognitive_style_distribution
        .as_ref()
        .expect("histogram present for non-style grouping");
    assert_eq!(histogram.get("analytical"), Some(&4));
    assert_eq!(histogram.get("intuitive"), Some(&3));

    let by_style = compute_grouped(
        &store,
        &bm,
        Dimension::CognitiveStyle,
        &DimensionFilter::new(),
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");
    assert!(by_style
        .groups
        .iter()
        .all(|g| g.cognitive_style_distribution.is_none()));
}

#[test]
fn dimension_without_values_yields_empty_groups() {
    let (store, bm) = seed_regions();
    let report = compute_grouped(
        &store,
        &bm,
        Dimension::Education,
        &DimensionFilter::new(),
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");
    assert!(report.groups.is_empty());
    assert_eq!(report.total_groups, 0);
    assert_eq!(report.total_records, 0);
}

#[test]
fn empty_metrics_are_omitted_per_group() {
    let (store, bm) = seed_regions();
    let report = compute_grouped(
        &store,
        &bm,
        Dimension::Region,
        &DimensionFilter::new(),
        EngineConfig::default(),
        QueryLimits::default(),
    )
    .expect("grouped");
    for group in &report.groups {
        assert_eq!(group.statistics.len(), 1, "only total_eq is populated");
        assert_eq!(group.statistics[0].metric, MetricKey::TotalEq);
        assert_eq!(group.statistics[0].n, group.count);
    }
}
