use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::{BenchmarkId, ValidationError};

/// Lifecycle status of a benchmark dataset. Only the finalize pipeline moves
/// a benchmark out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkStatus {
    Pending,
    Completed,
    Failed,
}

impl BenchmarkStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ValidationError(format!("unknown benchmark status: {other}"))),
        }
    }
}

impl Display for BenchmarkStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub id: BenchmarkId,
    pub name: String,
    pub status: BenchmarkStatus,
    pub rows_declared: u64,
    pub rows_processed: u64,
    pub created_at: i64,
    pub processed_at: Option<i64>,
}
