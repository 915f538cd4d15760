use rusqlite::params;

use equa_bench_model::{
    Benchmark, BenchmarkId, BenchmarkStatus, DataPoint, Dimension, FinalizePhase, JobId, JobStatus,
    MetricKey, MetricStatistic, TopPerformerProfile, UploadJob,
};

use crate::{unix_now, Store, StoreError};

impl Store {
    pub fn create_benchmark(&self, benchmark: &Benchmark) -> Result<(), StoreError> {
        self.connection().execute(
            "INSERT INTO benchmarks (id, name, status, rows_declared, rows_processed, created_at, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                benchmark.id.as_str(),
                benchmark.name,
                benchmark.status.as_str(),
                benchmark.rows_declared as i64,
                benchmark.rows_processed as i64,
                benchmark.created_at,
                benchmark.processed_at,
            ],
        )?;
        Ok(())
    }

    pub fn mark_benchmark_completed(
        &self,
        id: &BenchmarkId,
        rows_processed: u64,
    ) -> Result<(), StoreError> {
        self.connection().execute(
            "UPDATE benchmarks SET status = ?1, rows_processed = ?2, processed_at = ?3 WHERE id = ?4",
            params![
                BenchmarkStatus::Completed.as_str(),
                rows_processed as i64,
                unix_now(),
                id.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn mark_benchmark_failed(&self, id: &BenchmarkId) -> Result<(), StoreError> {
        self.connection().execute(
            "UPDATE benchmarks SET status = ?1, processed_at = ?2 WHERE id = ?3",
            params![BenchmarkStatus::Failed.as_str(), unix_now(), id.as_str()],
        )?;
        Ok(())
    }

    /// Bulk-insert respondent rows. This is the ingestion collaborator's
    /// entry point; the analytics engine itself never mutates data points.
    pub fn insert_data_points(&mut self, points: &[DataPoint]) -> Result<(), StoreError> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut columns = vec!["id".to_string(), "benchmark_id".to_string()];
            for dimension in Dimension::all() {
                columns.push(dimension.column().to_string());
            }
            for metric in MetricKey::all() {
                columns.push(metric.column().to_string());
            }
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("?{i}")).collect();
            let insert_sql = format!(
                "INSERT INTO data_points ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            );
            let mut stmt = tx.prepare(&insert_sql)?;
            for point in points {
                let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(columns.len());
                values.push(rusqlite::types::Value::Text(point.id.clone()));
                values.push(rusqlite::types::Value::Text(
                    point.benchmark_id.as_str().to_string(),
                ));
                for dimension in Dimension::all() {
                    values.push(match point.dimension(*dimension) {
                        Some(v) => rusqlite::types::Value::Text(v.to_string()),
                        None => rusqlite::types::Value::Null,
                    });
                }
                for metric in MetricKey::all() {
                    values.push(match point.metric(*metric) {
                        Some(v) => rusqlite::types::Value::Real(v),
                        None => rusqlite::types::Value::Null,
                    });
                }
                stmt.execute(rusqlite::params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove the statistic rows for one filter scope, ahead of a
    /// delete-then-recreate pass.
    pub fn delete_statistics(
        &self,
        benchmark: &BenchmarkId,
        filter_signature: &str,
    ) -> Result<usize, StoreError> {
        let deleted = self.connection().execute(
            "DELETE FROM precomputed_statistics WHERE benchmark_id = ?1 AND filter_signature = ?2",
            params![benchmark.as_str(), filter_signature],
        )?;
        Ok(deleted)
    }

    pub fn insert_statistics(
        &mut self,
        benchmark: &BenchmarkId,
        filter_signature: &str,
        statistics: &[MetricStatistic],
    ) -> Result<(), StoreError> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO precomputed_statistics (
                   benchmark_id, metric, filter_signature,
                   n, mean, median, stddev, min, max, p10, p25, p50, p75, p90, p95
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;
            for s in statistics {
                stmt.execute(params![
                    benchmark.as_str(),
                    s.metric.as_str(),
                    filter_signature,
                    s.n as i64,
                    s.mean,
                    s.median,
                    s.stddev,
                    s.min,
                    s.max,
                    s.p10,
                    s.p25,
                    s.p50,
                    s.p75,
                    s.p90,
                    s.p95,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_profiles(&self, benchmark: &BenchmarkId) -> Result<usize, StoreError> {
        let deleted = self.connection().execute(
            "DELETE FROM top_performer_profiles WHERE benchmark_id = ?1",
            params![benchmark.as_str()],
        )?;
        Ok(deleted)
    }

    pub fn insert_profile(&self, profile: &TopPerformerProfile) -> Result<(), StoreError> {
        let top_competencies = serde_json::to_string(&profile.top_competencies)
            .map_err(|e| StoreError(format!("encode top_competencies: {e}")))?;
        let top_talents = serde_json::to_string(&profile.top_talents)
            .map_err(|e| StoreError(format!("encode top_talents: {e}")))?;
        let secondary_talents = profile
            .secondary_talents
            .as_ref()
            .map(|list| {
                serde_json::to_string(list)
                    .map_err(|e| StoreError(format!("encode secondary_talents: {e}")))
            })
            .transpose()?;
        self.connection().execute(
            "INSERT INTO top_performer_profiles (
               benchmark_id, outcome, filter_signature, sample_size,
               top_competencies, top_talents, secondary_talents, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                profile.benchmark_id.as_str(),
                profile.outcome.as_str(),
                profile.filters.signature(),
                profile.sample_size as i64,
                top_competencies,
                top_talents,
                secondary_talents,
                profile.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn create_job(&self, job: &UploadJob) -> Result<(), StoreError> {
        self.connection().execute(
            "INSERT INTO upload_jobs (
               id, benchmark_id, status, progress, current_phase,
               rows_declared, rows_processed, error_message, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.id.as_str(),
                job.benchmark_id.as_str(),
                job.status.as_str(),
                i64::from(job.progress),
                job.current_phase.map(FinalizePhase::as_str),
                job.rows_declared as i64,
                job.rows_processed as i64,
                job.error_message,
                job.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn mark_job_running(&self, id: &JobId) -> Result<(), StoreError> {
        self.connection().execute(
            "UPDATE upload_jobs SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![JobStatus::Running.as_str(), unix_now(), id.as_str()],
        )?;
        Ok(())
    }

    /// Write one pipeline progress checkpoint.
    pub fn job_checkpoint(
        &self,
        id: &JobId,
        progress: u8,
        phase: FinalizePhase,
    ) -> Result<(), StoreError> {
        self.connection().execute(
            "UPDATE upload_jobs SET progress = ?1, current_phase = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                i64::from(progress),
                phase.as_str(),
                unix_now(),
                id.as_str()
            ],
        )?;
        Ok(())
    }

    pub fn complete_job(&self, id: &JobId, rows_processed: u64) -> Result<(), StoreError> {
        self.connection().execute(
            "UPDATE upload_jobs SET status = ?1, progress = 100, current_phase = NULL,
               rows_processed = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                JobStatus::Completed.as_str(),
                rows_processed as i64,
                unix_now(),
                id.as_str()
            ],
        )?;
        Ok(())
    }

    pub fn fail_job(&self, id: &JobId, message: &str) -> Result<(), StoreError> {
        self.connection().execute(
            "UPDATE upload_jobs SET status = ?1, error_message = ?2, updated_at = ?3 WHERE id = ?4",
            params![JobStatus::Failed.as_str(), message, unix_now(), id.as_str()],
        )?;
        Ok(())
    }
}
