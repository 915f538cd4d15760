use serde::{Deserialize, Serialize};

use equa_bench_model::{
    AttributeDelta, BenchmarkId, ConfidenceLevel, DimensionFilter, EnrichedProfile, MetricClass,
    MetricKey,
};
use equa_bench_stats::round2;
use equa_bench_store::Store;

use crate::AnalyticsError;

/// Delta-from-population-average above which a stored attribute counts as
/// significant. Fixed business constant on the underlying score scale.
pub const SIGNIFICANT_DELTA_THRESHOLD: f64 = 3.0;

/// Divisor of the approximate effect proxy. `delta / 15` is a pragmatic
/// business heuristic, not a standardized effect-size measure.
pub const EFFECT_PROXY_SCALE: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformerReport {
    pub top_performers: Vec<EnrichedProfile>,
    pub total: usize,
    pub fallback_used: bool,
}

fn significant_count(attributes: &[AttributeDelta]) -> u64 {
    attributes
        .iter()
        .filter(|a| a.delta > SIGNIFICANT_DELTA_THRESHOLD)
        .count() as u64
}

fn approx_effect_proxy(attributes: &[AttributeDelta]) -> f64 {
    if attributes.is_empty() {
        return 0.0;
    }
    let sum: f64 = attributes.iter().map(|a| a.delta / EFFECT_PROXY_SCALE).sum();
    round2(sum / attributes.len() as f64)
}

/// One-shot enrichment pass over the stored profile for (outcome, filters).
///
/// When no profile exists for the exact filter scope, the global profile is
/// served instead and the report carries `fallback_used` so callers can tell
/// exact from approximated results. No stored state is mutated.
pub fn get_top_performers(
    store: &Store,
    benchmark: &BenchmarkId,
    outcome: MetricKey,
    filter: &DimensionFilter,
) -> Result<TopPerformerReport, AnalyticsError> {
    if outcome.class() != MetricClass::Outcome {
        return Err(AnalyticsError::Validation(format!(
            "metric {outcome} is not an outcome"
        )));
    }

    let mut fallback_used = false;
    let mut profile = store.find_profile(benchmark, outcome, &filter.signature())?;
    if profile.is_none() && !filter.is_empty() {
        profile = store.find_profile(benchmark, outcome, "")?;
        fallback_used = profile.is_some();
    }
    let Some(profile) = profile else {
        return Ok(TopPerformerReport {
            top_performers: Vec::new(),
            total: 0,
            fallback_used: false,
        });
    };

    // Enrichment is computed against the profile's own scope, which for a
    // fallback is the global scope rather than the requested filters.
    let total_population = store.count_metric_non_null(benchmark, outcome, &profile.filters)?;
    let enriched = EnrichedProfile {
        confidence_level: ConfidenceLevel::from_sample_size(profile.sample_size),
        significant_competencies: significant_count(&profile.top_competencies),
        significant_talents: significant_count(&profile.top_talents),
        approx_effect_proxy_competencies: approx_effect_proxy(&profile.top_competencies),
        approx_effect_proxy_talents: approx_effect_proxy(&profile.top_talents),
        total_population,
        profile,
    };
    Ok(TopPerformerReport {
        top_performers: vec![enriched],
        total: 1,
        fallback_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(d: f64) -> AttributeDelta {
        AttributeDelta {
            key: MetricKey::SelfAwareness,
            value: 80.0 + d,
            delta: d,
        }
    }

    #[test]
    fn significance_is_strictly_above_threshold() {
        let attrs = vec![delta(5.0), delta(2.0), delta(8.0)];
        assert_eq!(significant_count(&attrs), 2);
        let at_threshold = vec![delta(3.0)];
        assert_eq!(significant_count(&at_threshold), 0);
    }

    #[test]
    fn effect_proxy_is_mean_of_scaled_deltas() {
        let attrs = vec![delta(15.0), delta(30.0)];
        assert_eq!(approx_effect_proxy(&attrs), 1.5);
        assert_eq!(approx_effect_proxy(&[]), 0.0);
    }
}
