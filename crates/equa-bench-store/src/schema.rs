use crate::{Store, StoreError};

pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_DDL: &str = "
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=NORMAL;
    PRAGMA temp_store=MEMORY;
    PRAGMA cache_size=-32000;
    CREATE TABLE IF NOT EXISTS benchmarks (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      status TEXT NOT NULL,
      rows_declared INTEGER NOT NULL DEFAULT 0,
      rows_processed INTEGER NOT NULL DEFAULT 0,
      created_at INTEGER NOT NULL,
      processed_at INTEGER
    );
    CREATE TABLE IF NOT EXISTS data_points (
      id TEXT PRIMARY KEY,
      benchmark_id TEXT NOT NULL,
      region TEXT,
      country TEXT,
      job_role TEXT,
      job_function TEXT,
      sector TEXT,
      age_range TEXT,
      gender TEXT,
      education TEXT,
      cognitive_style TEXT,
      total_eq REAL,
      self_awareness REAL,
      self_management REAL,
      social_awareness REAL,
      relationship_management REAL,
      decision_making REAL,
      effectiveness REAL,
      relationships REAL,
      wellbeing REAL,
      quality_of_life REAL,
      adaptability REAL,
      collaboration REAL,
      critical_thinking REAL,
      resilience REAL,
      vision REAL,
      drive REAL
    );
    CREATE INDEX IF NOT EXISTS idx_data_points_benchmark
      ON data_points (benchmark_id);
    CREATE TABLE IF NOT EXISTS precomputed_statistics (
      benchmark_id TEXT NOT NULL,
      metric TEXT NOT NULL,
      filter_signature TEXT NOT NULL DEFAULT '',
      n INTEGER NOT NULL,
      mean REAL NOT NULL,
      median REAL NOT NULL,
      stddev REAL NOT NULL,
      min REAL NOT NULL,
      max REAL NOT NULL,
      p10 REAL NOT NULL,
      p25 REAL NOT NULL,
      p50 REAL NOT NULL,
      p75 REAL NOT NULL,
      p90 REAL NOT NULL,
      p95 REAL NOT NULL,
      PRIMARY KEY (benchmark_id, metric, filter_signature)
    );
    CREATE TABLE IF NOT EXISTS top_performer_profiles (
      benchmark_id TEXT NOT NULL,
      outcome TEXT NOT NULL,
      filter_signature TEXT NOT NULL DEFAULT '',
      sample_size INTEGER NOT NULL,
      top_competencies TEXT NOT NULL,
      top_talents TEXT NOT NULL,
      secondary_talents TEXT,
      created_at INTEGER NOT NULL,
      PRIMARY KEY (benchmark_id, outcome, filter_signature)
    );
    CREATE TABLE IF NOT EXISTS upload_jobs (
      id TEXT PRIMARY KEY,
      benchmark_id TEXT NOT NULL,
      status TEXT NOT NULL,
      progress INTEGER NOT NULL DEFAULT 0,
      current_phase TEXT,
      rows_declared INTEGER NOT NULL DEFAULT 0,
      rows_processed INTEGER NOT NULL DEFAULT 0,
      error_message TEXT,
      updated_at INTEGER NOT NULL
    );
";

impl Store {
    pub(crate) fn ensure_schema(&self) -> Result<(), StoreError> {
        self.connection().execute_batch(SCHEMA_DDL)?;
        self.connection()
            .execute_batch(&format!("PRAGMA user_version={SCHEMA_VERSION};"))?;
        Ok(())
    }
}
