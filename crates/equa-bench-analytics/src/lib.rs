#![forbid(unsafe_code)]

//! Query-time analytics over the benchmark store.
//!
//! Everything in this crate is read-only with respect to persisted
//! artifacts: the finalize pipeline is the single writer of statistic and
//! profile rows, and query paths never self-heal the cache by writing back.

mod grouped;
mod statistics;
mod top_performers;

use std::fmt::{Display, Formatter};

use equa_bench_stats::PercentileMethod;
use equa_bench_store::StoreError;

pub const CRATE_NAME: &str = "equa-bench-analytics";

pub use grouped::{compute_grouped, GroupedReport};
pub use statistics::{
    compute_global_statistics, get_statistics, native_descriptive, StatisticsReport,
};
pub use top_performers::{
    get_top_performers, TopPerformerReport, EFFECT_PROXY_SCALE, SIGNIFICANT_DELTA_THRESHOLD,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Request is structurally invalid; nothing was computed.
    Validation(String),
    /// Request was rejected by a resource policy (scan bound).
    Policy(String),
    /// Storage failure.
    Store(String),
}

impl Display for AnalyticsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) | Self::Policy(msg) | Self::Store(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for AnalyticsError {}

impl From<StoreError> for AnalyticsError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.0)
    }
}

/// Engine-wide computation settings.
///
/// The percentile method is configurable because the two historical code
/// paths disagreed (storage-side interpolation vs in-memory nearest-rank);
/// both strategies here honor whichever method is selected, and the default
/// is the canonical nearest-rank definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    pub percentile_method: PercentileMethod,
}

/// Resource bounds for query-time computation.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    /// Maximum data-point rows an in-memory scan may materialize per metric.
    pub max_scan_rows: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_scan_rows: 500_000,
        }
    }
}
