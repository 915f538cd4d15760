use serde::{Deserialize, Serialize};

use crate::filter::DimensionFilter;
use crate::ids::BenchmarkId;
use crate::registry::MetricKey;

/// Sample sizes at or above this are `high` confidence.
pub const CONFIDENCE_HIGH_MIN_SAMPLE: u64 = 385;
/// Sample sizes at or above this (and below high) are `medium` confidence.
pub const CONFIDENCE_MEDIUM_MIN_SAMPLE: u64 = 100;

/// Coarse sample-size bucket. The breakpoints are fixed business constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    #[must_use]
    pub const fn from_sample_size(sample_size: u64) -> Self {
        if sample_size >= CONFIDENCE_HIGH_MIN_SAMPLE {
            Self::High
        } else if sample_size >= CONFIDENCE_MEDIUM_MIN_SAMPLE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// One top-ranked attribute of a top-performer segment: the segment's mean
/// value and its delta from the population average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDelta {
    pub key: MetricKey,
    pub value: f64,
    pub delta: f64,
}

/// Stored top-performer segment profile for one (benchmark, outcome, filter
/// scope). Written only by the finalize pipeline; read and enriched at query
/// time, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformerProfile {
    pub benchmark_id: BenchmarkId,
    pub outcome: MetricKey,
    pub filters: DimensionFilter,
    pub sample_size: u64,
    pub top_competencies: Vec<AttributeDelta>,
    pub top_talents: Vec<AttributeDelta>,
    /// Talents ranked past the top list, when any exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_talents: Option<Vec<AttributeDelta>>,
    pub created_at: i64,
}

/// A stored profile plus the query-time enrichment fields. The effect
/// proxies are an approximate business heuristic (delta scaled by a fixed
/// constant), not a standardized effect-size statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProfile {
    #[serde(flatten)]
    pub profile: TopPerformerProfile,
    pub total_population: u64,
    pub confidence_level: ConfidenceLevel,
    pub significant_competencies: u64,
    pub significant_talents: u64,
    pub approx_effect_proxy_competencies: f64,
    pub approx_effect_proxy_talents: f64,
}
