use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::registry::MetricKey;

/// Descriptive statistics for one metric over one population scope.
///
/// Values are rounded to two decimals at this boundary; intermediate
/// computation never rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistic {
    pub metric: MetricKey,
    pub n: u64,
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

impl MetricStatistic {
    /// Percentiles in ascending order, for monotonicity checks.
    #[must_use]
    pub fn percentiles(&self) -> [f64; 6] {
        [self.p10, self.p25, self.p50, self.p75, self.p90, self.p95]
    }

    #[must_use]
    pub fn percentiles_monotonic(&self) -> bool {
        self.percentiles().windows(2).all(|w| w[0] <= w[1])
    }
}

/// Statistics for one group value of a grouped-analytics request, with an
/// optional cognitive-style cross-tabulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStatistics {
    pub value: String,
    pub count: u64,
    pub statistics: Vec<MetricStatistic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_style_distribution: Option<BTreeMap<String, u64>>,
}
