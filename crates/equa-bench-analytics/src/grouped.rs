use serde::{Deserialize, Serialize};

use equa_bench_model::{BenchmarkId, Dimension, DimensionFilter, GroupStatistics};
use equa_bench_store::Store;

use crate::statistics::filtered_statistics;
use crate::{AnalyticsError, EngineConfig, QueryLimits};

/// Grouped analytics for one dimension over a (possibly pre-filtered)
/// population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedReport {
    pub group_by: Dimension,
    pub groups: Vec<GroupStatistics>,
    pub total_groups: usize,
    pub total_records: u64,
}

/// Partition the population by `group_by` and compute per-group statistics
/// for every registry metric, plus a cognitive-style cross-tabulation for
/// groups not themselves keyed on cognitive style.
///
/// Any extra filter targeting the group-by dimension is dropped so a group's
/// sub-population is never self-contradictory. Groups are ordered by
/// descending population size, ties broken lexically by group value.
pub fn compute_grouped(
    store: &Store,
    benchmark: &BenchmarkId,
    group_by: Dimension,
    extra_filters: &DimensionFilter,
    cfg: EngineConfig,
    limits: QueryLimits,
) -> Result<GroupedReport, AnalyticsError> {
    if !Dimension::groupable().contains(&group_by) {
        return Err(AnalyticsError::Validation(format!(
            "dimension {group_by} is not groupable"
        )));
    }
    let base = extra_filters.without(group_by);
    let group_values = store.distinct_dimension_values(benchmark, group_by, &base)?;

    let mut groups = Vec::with_capacity(group_values.len());
    for value in group_values {
        let sub_filter = base.clone().with(group_by, value.clone());
        let count = store.count_data_points(benchmark, &sub_filter)?;
        let statistics = filtered_statistics(store, benchmark, &sub_filter, cfg, limits)?;
        let cognitive_style_distribution = if group_by == Dimension::CognitiveStyle {
            None
        } else {
            Some(store.dimension_histogram(benchmark, Dimension::CognitiveStyle, &sub_filter)?)
        };
        groups.push(GroupStatistics {
            value,
            count,
            statistics,
            cognitive_style_distribution,
        });
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    let total_records = groups.iter().map(|g| g.count).sum();
    Ok(GroupedReport {
        group_by,
        total_groups: groups.len(),
        total_records,
        groups,
    })
}
