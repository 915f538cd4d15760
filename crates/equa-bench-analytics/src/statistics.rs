use serde::{Deserialize, Serialize};
use tracing::warn;

use equa_bench_model::{BenchmarkId, DimensionFilter, MetricKey, MetricStatistic};
use equa_bench_stats::{
    compute_descriptive, rank_index, stddev_from_sums, Descriptive, PercentileMethod,
};
use equa_bench_store::Store;

use crate::{AnalyticsError, EngineConfig, QueryLimits};

/// Statistics for one population scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub statistics: Vec<MetricStatistic>,
    pub total: u64,
    pub filtered: bool,
}

pub(crate) fn to_statistic(metric: MetricKey, descriptive: &Descriptive) -> MetricStatistic {
    let d = descriptive.rounded();
    MetricStatistic {
        metric,
        n: d.n,
        mean: d.mean,
        median: d.median,
        stddev: d.std_dev,
        min: d.min,
        max: d.max,
        p10: d.p10,
        p25: d.p25,
        p50: d.p50,
        p75: d.p75,
        p90: d.p90,
        p95: d.p95,
    }
}

/// Native-aggregate strategy: counts, sums and extrema are computed by the
/// storage engine, percentiles by storage-side rank selection. Covers the
/// full (unfiltered) benchmark population only.
pub fn native_descriptive(
    store: &Store,
    benchmark: &BenchmarkId,
    metric: MetricKey,
    method: PercentileMethod,
) -> Result<Option<Descriptive>, AnalyticsError> {
    let Some(agg) = store.metric_aggregates(benchmark, metric)? else {
        return Ok(None);
    };
    let n = agg.n;
    let value_at = |rank: u64| -> Result<f64, AnalyticsError> {
        store
            .metric_value_at_rank(benchmark, metric, rank)?
            .ok_or_else(|| {
                AnalyticsError::Store(format!(
                    "rank {rank} out of range for metric {metric} (n={n})"
                ))
            })
    };
    let percentile = |p: f64| -> Result<f64, AnalyticsError> {
        match method {
            PercentileMethod::NearestRank => value_at(rank_index(p, n as usize) as u64),
            PercentileMethod::Linear => {
                let rank = (p / 100.0) * (n - 1) as f64;
                let lower = rank.floor() as u64;
                let fraction = rank - lower as f64;
                let lower_value = value_at(lower)?;
                if fraction == 0.0 || lower + 1 >= n {
                    return Ok(lower_value);
                }
                let upper_value = value_at(lower + 1)?;
                Ok(lower_value + fraction * (upper_value - lower_value))
            }
        }
    };
    let p50 = percentile(50.0)?;
    Ok(Some(Descriptive {
        n,
        mean: agg.mean,
        median: p50,
        std_dev: stddev_from_sums(n, agg.sum, agg.sum_squares),
        min: agg.min,
        max: agg.max,
        p10: percentile(10.0)?,
        p25: percentile(25.0)?,
        p50,
        p75: percentile(75.0)?,
        p90: percentile(90.0)?,
        p95: percentile(95.0)?,
    }))
}

/// Compute statistics for every registry metric over the full population
/// with the native strategy. A failing metric is logged and omitted; it
/// never aborts the pass.
pub fn compute_global_statistics(
    store: &Store,
    benchmark: &BenchmarkId,
    cfg: EngineConfig,
) -> Result<Vec<MetricStatistic>, AnalyticsError> {
    let mut statistics = Vec::new();
    for metric in MetricKey::all() {
        match native_descriptive(store, benchmark, *metric, cfg.percentile_method) {
            Ok(Some(descriptive)) => statistics.push(to_statistic(*metric, &descriptive)),
            Ok(None) => {}
            Err(err) => {
                warn!(metric = %metric, error = %err, "metric statistics failed, skipping");
            }
        }
    }
    Ok(statistics)
}

/// In-memory strategy for one metric over a filtered population. The scan
/// is bounded by `limits.max_scan_rows`; exceeding it is a policy rejection.
fn filtered_descriptive(
    store: &Store,
    benchmark: &BenchmarkId,
    metric: MetricKey,
    filter: &DimensionFilter,
    cfg: EngineConfig,
    limits: QueryLimits,
) -> Result<Option<Descriptive>, AnalyticsError> {
    let values = store.load_metric_values(benchmark, metric, filter, limits.max_scan_rows + 1)?;
    if values.len() > limits.max_scan_rows {
        return Err(AnalyticsError::Policy(format!(
            "scan for metric {metric} exceeds {} rows",
            limits.max_scan_rows
        )));
    }
    Ok(compute_descriptive(&values, cfg.percentile_method))
}

pub(crate) fn filtered_statistics(
    store: &Store,
    benchmark: &BenchmarkId,
    filter: &DimensionFilter,
    cfg: EngineConfig,
    limits: QueryLimits,
) -> Result<Vec<MetricStatistic>, AnalyticsError> {
    let mut statistics = Vec::new();
    for metric in MetricKey::all() {
        if let Some(descriptive) =
            filtered_descriptive(store, benchmark, *metric, filter, cfg, limits)?
        {
            statistics.push(to_statistic(*metric, &descriptive));
        }
    }
    Ok(statistics)
}

/// Statistics cache policy.
///
/// No filters: serve precomputed global rows when present; otherwise compute
/// live over the full population and return the result without writing it
/// back (the finalize pipeline is the only cache writer). Any filter: always
/// compute live over the narrowed population.
pub fn get_statistics(
    store: &Store,
    benchmark: &BenchmarkId,
    filter: &DimensionFilter,
    cfg: EngineConfig,
    limits: QueryLimits,
) -> Result<StatisticsReport, AnalyticsError> {
    let total = store.count_data_points(benchmark, filter)?;
    if filter.is_empty() {
        let precomputed = store.read_statistics(benchmark, "")?;
        let statistics = if precomputed.is_empty() {
            compute_global_statistics(store, benchmark, cfg)?
        } else {
            precomputed
        };
        return Ok(StatisticsReport {
            statistics,
            total,
            filtered: false,
        });
    }
    Ok(StatisticsReport {
        statistics: filtered_statistics(store, benchmark, filter, cfg, limits)?,
        total,
        filtered: true,
    })
}
