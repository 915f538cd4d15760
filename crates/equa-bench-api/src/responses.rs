// SPDX-License-Identifier: Apache-2.0

use equa_bench_model::JobId;
use serde::{Deserialize, Serialize};

/// Response of a finalize trigger that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeAccepted {
    pub job_id: JobId,
    pub status: String,
    pub rows_processed: u64,
    pub statistics_written: usize,
    pub profiles_written: usize,
}

/// Response of a finalize trigger that failed; the job carries the error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeRejected {
    pub job_id: JobId,
    pub status: String,
    pub error: String,
}
