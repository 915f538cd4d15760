use std::collections::BTreeMap;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use equa_bench_model::{
    AttributeDelta, Benchmark, BenchmarkId, BenchmarkStatus, Dimension, DimensionFilter,
    FinalizePhase, JobId, JobStatus, MetricKey, MetricStatistic, TopPerformerProfile, UploadJob,
};

use crate::sql::push_filter_clauses;
use crate::{Store, StoreError};

/// Raw SQL aggregates over the non-null values of one metric, for the
/// native computation strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricAggregates {
    pub n: u64,
    pub sum: f64,
    pub sum_squares: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Store {
    pub fn get_benchmark(&self, id: &BenchmarkId) -> Result<Option<Benchmark>, StoreError> {
        self.connection()
            .query_row(
                "SELECT id, name, status, rows_declared, rows_processed, created_at, processed_at
                 FROM benchmarks WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                    ))
                },
            )
            .optional()?
            .map(
                |(id, name, status, rows_declared, rows_processed, created_at, processed_at)| {
                    Ok(Benchmark {
                        id: BenchmarkId::parse(&id).map_err(|e| StoreError(e.to_string()))?,
                        name,
                        status: BenchmarkStatus::parse(&status)
                            .map_err(|e| StoreError(e.to_string()))?,
                        rows_declared: rows_declared.max(0) as u64,
                        rows_processed: rows_processed.max(0) as u64,
                        created_at,
                        processed_at,
                    })
                },
            )
            .transpose()
    }

    pub fn get_job(&self, id: &JobId) -> Result<Option<UploadJob>, StoreError> {
        self.connection()
            .query_row(
                "SELECT id, benchmark_id, status, progress, current_phase,
                        rows_declared, rows_processed, error_message, updated_at
                 FROM upload_jobs WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, i64>(8)?,
                    ))
                },
            )
            .optional()?
            .map(|row| {
                let (id, benchmark_id, status, progress, phase, declared, processed, error, at) =
                    row;
                Ok(UploadJob {
                    id: JobId::parse(&id).map_err(|e| StoreError(e.to_string()))?,
                    benchmark_id: BenchmarkId::parse(&benchmark_id)
                        .map_err(|e| StoreError(e.to_string()))?,
                    status: JobStatus::parse(&status).map_err(|e| StoreError(e.to_string()))?,
                    progress: progress.clamp(0, 100) as u8,
                    current_phase: phase
                        .as_deref()
                        .map(FinalizePhase::parse)
                        .transpose()
                        .map_err(|e| StoreError(e.to_string()))?,
                    rows_declared: declared.max(0) as u64,
                    rows_processed: processed.max(0) as u64,
                    error_message: error,
                    updated_at: at,
                })
            })
            .transpose()
    }

    /// Number of data points matching the filter scope.
    pub fn count_data_points(
        &self,
        benchmark: &BenchmarkId,
        filter: &DimensionFilter,
    ) -> Result<u64, StoreError> {
        let mut sql =
            String::from("SELECT COUNT(*) FROM data_points WHERE benchmark_id = ?");
        let mut params: Vec<Value> = vec![Value::Text(benchmark.as_str().to_string())];
        push_filter_clauses(filter, &mut sql, &mut params);
        let count: i64 = self
            .connection()
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Number of data points with a non-null value for `metric` in scope.
    pub fn count_metric_non_null(
        &self,
        benchmark: &BenchmarkId,
        metric: MetricKey,
        filter: &DimensionFilter,
    ) -> Result<u64, StoreError> {
        let mut sql = format!(
            "SELECT COUNT(*) FROM data_points WHERE benchmark_id = ? AND {} IS NOT NULL",
            metric.column()
        );
        let mut params: Vec<Value> = vec![Value::Text(benchmark.as_str().to_string())];
        push_filter_clauses(filter, &mut sql, &mut params);
        let count: i64 = self
            .connection()
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Non-null values of one metric in scope, capped at `limit` rows. The
    /// caller owns the scan-bound policy; passing `cap + 1` lets it detect
    /// an exceeded cap from the result length.
    pub fn load_metric_values(
        &self,
        benchmark: &BenchmarkId,
        metric: MetricKey,
        filter: &DimensionFilter,
        limit: usize,
    ) -> Result<Vec<f64>, StoreError> {
        let mut sql = format!(
            "SELECT {col} FROM data_points WHERE benchmark_id = ? AND {col} IS NOT NULL",
            col = metric.column()
        );
        let mut params: Vec<Value> = vec![Value::Text(benchmark.as_str().to_string())];
        push_filter_clauses(filter, &mut sql, &mut params);
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit as i64));
        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            row.get::<_, f64>(0)
        })?;
        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }

    /// Distinct non-null values of a dimension in scope, lexically ordered.
    pub fn distinct_dimension_values(
        &self,
        benchmark: &BenchmarkId,
        dimension: Dimension,
        filter: &DimensionFilter,
    ) -> Result<Vec<String>, StoreError> {
        let mut sql = format!(
            "SELECT DISTINCT {col} FROM data_points WHERE benchmark_id = ? AND {col} IS NOT NULL",
            col = dimension.column()
        );
        let mut params: Vec<Value> = vec![Value::Text(benchmark.as_str().to_string())];
        push_filter_clauses(filter, &mut sql, &mut params);
        sql.push_str(&format!(" ORDER BY {}", dimension.column()));
        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            row.get::<_, String>(0)
        })?;
        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }

    /// Count-per-value cross-tabulation of a dimension in scope.
    pub fn dimension_histogram(
        &self,
        benchmark: &BenchmarkId,
        dimension: Dimension,
        filter: &DimensionFilter,
    ) -> Result<BTreeMap<String, u64>, StoreError> {
        let mut sql = format!(
            "SELECT {col}, COUNT(*) FROM data_points WHERE benchmark_id = ? AND {col} IS NOT NULL",
            col = dimension.column()
        );
        let mut params: Vec<Value> = vec![Value::Text(benchmark.as_str().to_string())];
        push_filter_clauses(filter, &mut sql, &mut params);
        sql.push_str(&format!(" GROUP BY {}", dimension.column()));
        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut histogram = BTreeMap::new();
        for row in rows {
            let (value, count) = row?;
            histogram.insert(value, count.max(0) as u64);
        }
        Ok(histogram)
    }

    /// SQL-side aggregates for the native strategy over the full benchmark
    /// population. `None` when the metric has no non-null values.
    pub fn metric_aggregates(
        &self,
        benchmark: &BenchmarkId,
        metric: MetricKey,
    ) -> Result<Option<MetricAggregates>, StoreError> {
        let col = metric.column();
        let sql = format!(
            "SELECT COUNT({col}), SUM({col}), SUM({col} * {col}), AVG({col}), MIN({col}), MAX({col})
             FROM data_points WHERE benchmark_id = ?1 AND {col} IS NOT NULL"
        );
        let row = self.connection().query_row(
            &sql,
            params![benchmark.as_str()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                ))
            },
        )?;
        let (n, sum, sum_squares, mean, min, max) = row;
        if n <= 0 {
            return Ok(None);
        }
        match (sum, sum_squares, mean, min, max) {
            (Some(sum), Some(sum_squares), Some(mean), Some(min), Some(max)) => {
                Ok(Some(MetricAggregates {
                    n: n as u64,
                    sum,
                    sum_squares,
                    mean,
                    min,
                    max,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Value of `metric` at the given zero-based ascending rank over the
    /// full benchmark population, selected by the storage engine.
    pub fn metric_value_at_rank(
        &self,
        benchmark: &BenchmarkId,
        metric: MetricKey,
        rank: u64,
    ) -> Result<Option<f64>, StoreError> {
        let col = metric.column();
        let sql = format!(
            "SELECT {col} FROM data_points
             WHERE benchmark_id = ?1 AND {col} IS NOT NULL
             ORDER BY {col} ASC LIMIT 1 OFFSET ?2"
        );
        let value = self
            .connection()
            .query_row(&sql, params![benchmark.as_str(), rank as i64], |row| {
                row.get::<_, f64>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Population mean of one attribute over the full benchmark, for the
    /// correlations baselines.
    pub fn population_attribute_mean(
        &self,
        benchmark: &BenchmarkId,
        attribute: MetricKey,
    ) -> Result<Option<f64>, StoreError> {
        let col = attribute.column();
        let sql = format!(
            "SELECT AVG({col}) FROM data_points WHERE benchmark_id = ?1 AND {col} IS NOT NULL"
        );
        let mean: Option<f64> =
            self.connection()
                .query_row(&sql, params![benchmark.as_str()], |row| row.get(0))?;
        Ok(mean)
    }

    /// Mean of one attribute across the top-performer segment: data points
    /// whose outcome value is at or above `threshold`.
    pub fn segment_attribute_mean(
        &self,
        benchmark: &BenchmarkId,
        outcome: MetricKey,
        threshold: f64,
        attribute: MetricKey,
    ) -> Result<Option<f64>, StoreError> {
        let sql = format!(
            "SELECT AVG({attr}) FROM data_points
             WHERE benchmark_id = ?1 AND {outcome} IS NOT NULL AND {outcome} >= ?2
               AND {attr} IS NOT NULL",
            attr = attribute.column(),
            outcome = outcome.column()
        );
        let mean: Option<f64> = self.connection().query_row(
            &sql,
            params![benchmark.as_str(), threshold],
            |row| row.get(0),
        )?;
        Ok(mean)
    }

    /// Size of the top-performer segment for one outcome.
    pub fn segment_size(
        &self,
        benchmark: &BenchmarkId,
        outcome: MetricKey,
        threshold: f64,
    ) -> Result<u64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM data_points
             WHERE benchmark_id = ?1 AND {outcome} IS NOT NULL AND {outcome} >= ?2",
            outcome = outcome.column()
        );
        let count: i64 = self.connection().query_row(
            &sql,
            params![benchmark.as_str(), threshold],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Precomputed statistic rows for one filter scope, in canonical metric
    /// registry order. Rows whose metric key is no longer in the registry
    /// are skipped.
    pub fn read_statistics(
        &self,
        benchmark: &BenchmarkId,
        filter_signature: &str,
    ) -> Result<Vec<MetricStatistic>, StoreError> {
        let mut stmt = self.connection().prepare(
            "SELECT metric, n, mean, median, stddev, min, max, p10, p25, p50, p75, p90, p95
             FROM precomputed_statistics
             WHERE benchmark_id = ?1 AND filter_signature = ?2",
        )?;
        let rows = stmt.query_map(params![benchmark.as_str(), filter_signature], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, f64>(8)?,
                row.get::<_, f64>(9)?,
                row.get::<_, f64>(10)?,
                row.get::<_, f64>(11)?,
                row.get::<_, f64>(12)?,
            ))
        })?;
        let mut statistics = Vec::new();
        for row in rows {
            let (metric, n, mean, median, stddev, min, max, p10, p25, p50, p75, p90, p95) = row?;
            let Ok(metric) = MetricKey::parse(&metric) else {
                continue;
            };
            statistics.push(MetricStatistic {
                metric,
                n: n.max(0) as u64,
                mean,
                median,
                stddev,
                min,
                max,
                p10,
                p25,
                p50,
                p75,
                p90,
                p95,
            });
        }
        statistics.sort_by_key(|s| s.metric.registry_index());
        Ok(statistics)
    }

    /// Stored top-performer profile for one (outcome, filter scope), if any.
    /// Attribute lists are decoded defensively: a corrupt column degrades to
    /// an empty list instead of failing the lookup.
    pub fn find_profile(
        &self,
        benchmark: &BenchmarkId,
        outcome: MetricKey,
        filter_signature: &str,
    ) -> Result<Option<TopPerformerProfile>, StoreError> {
        let row = self
            .connection()
            .query_row(
                "SELECT sample_size, top_competencies, top_talents, secondary_talents, created_at
                 FROM top_performer_profiles
                 WHERE benchmark_id = ?1 AND outcome = ?2 AND filter_signature = ?3",
                params![benchmark.as_str(), outcome.as_str(), filter_signature],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((sample_size, competencies_json, talents_json, secondary_json, created_at)) = row
        else {
            return Ok(None);
        };
        let filters = DimensionFilter::from_signature(filter_signature)
            .map_err(|e| StoreError(format!("decode filter signature: {e}")))?;
        Ok(Some(TopPerformerProfile {
            benchmark_id: benchmark.clone(),
            outcome,
            filters,
            sample_size: sample_size.max(0) as u64,
            top_competencies: decode_attribute_list(&competencies_json),
            top_talents: decode_attribute_list(&talents_json),
            secondary_talents: secondary_json
                .as_deref()
                .map(decode_attribute_list)
                .filter(|list| !list.is_empty()),
            created_at,
        }))
    }
}

fn decode_attribute_list(json: &str) -> Vec<AttributeDelta> {
    serde_json::from_str(json).unwrap_or_default()
}
