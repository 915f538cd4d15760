use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::{BenchmarkId, JobId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ValidationError(format!("unknown job status: {other}"))),
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phase labels written to the job record as the finalize pipeline advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizePhase {
    Statistics,
    Correlations,
    TopPerformers,
}

impl FinalizePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Statistics => "statistics",
            Self::Correlations => "correlations",
            Self::TopPerformers => "top_performers",
        }
    }

    /// Job progress checkpoint written when this phase begins.
    #[must_use]
    pub const fn progress_checkpoint(self) -> u8 {
        match self {
            Self::Statistics => 72,
            Self::Correlations => 82,
            Self::TopPerformers => 92,
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "statistics" => Ok(Self::Statistics),
            "correlations" => Ok(Self::Correlations),
            "top_performers" => Ok(Self::TopPerformers),
            other => Err(ValidationError(format!("unknown finalize phase: {other}"))),
        }
    }
}

impl Display for FinalizePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one ingestion+finalize run. Terminal once completed or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJob {
    pub id: JobId,
    pub benchmark_id: BenchmarkId,
    pub status: JobStatus,
    pub progress: u8,
    pub current_phase: Option<FinalizePhase>,
    pub rows_declared: u64,
    pub rows_processed: u64,
    pub error_message: Option<String>,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_checkpoints_are_fixed() {
        assert_eq!(FinalizePhase::Statistics.progress_checkpoint(), 72);
        assert_eq!(FinalizePhase::Correlations.progress_checkpoint(), 82);
        assert_eq!(FinalizePhase::TopPerformers.progress_checkpoint(), 92);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }
}
