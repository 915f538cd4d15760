#![forbid(unsafe_code)]

//! Library surface of the operations CLI, kept separate from argument
//! parsing so the commands are testable without a process boundary.

use equa_bench_analytics::{compute_global_statistics, EngineConfig};
use equa_bench_core::ExitCode;
use equa_bench_model::{BenchmarkId, JobId, UploadJob};
use equa_bench_store::Store;

pub const CRATE_NAME: &str = "equa-bench-cli";

#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: ExitCode,
}

impl CliError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::Validation,
        }
    }

    #[must_use]
    pub fn dependency(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::DependencyFailure,
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::Internal,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Out-of-band global statistics recompute: delete the global rows, rerun
/// the full-population pass, persist the result. Running it twice on an
/// unchanged population yields identical rows.
pub fn recompute_stats(
    store: &mut Store,
    benchmark: &BenchmarkId,
    cfg: EngineConfig,
) -> Result<usize, CliError> {
    if store
        .get_benchmark(benchmark)
        .map_err(|e| CliError::dependency(e.to_string()))?
        .is_none()
    {
        return Err(CliError::validation(format!(
            "unknown benchmark: {benchmark}"
        )));
    }
    store
        .delete_statistics(benchmark, "")
        .map_err(|e| CliError::dependency(e.to_string()))?;
    let statistics = compute_global_statistics(store, benchmark, cfg)
        .map_err(|e| CliError::dependency(e.to_string()))?;
    store
        .insert_statistics(benchmark, "", &statistics)
        .map_err(|e| CliError::dependency(e.to_string()))?;
    Ok(statistics.len())
}

pub fn job_status(store: &Store, job: &JobId) -> Result<UploadJob, CliError> {
    store
        .get_job(job)
        .map_err(|e| CliError::dependency(e.to_string()))?
        .ok_or_else(|| CliError::validation(format!("unknown job: {job}")))
}
