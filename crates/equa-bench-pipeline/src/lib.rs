// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! The finalize pipeline: the batch process that turns ingested data points
//! into queryable statistics and top-performer profiles.
//!
//! States: `pending -> statistics -> correlations -> top_performers ->
//! completed`, with terminal `failed` reachable from any state. Every phase
//! deletes its own prior output before writing, so a retried finalize run
//! converges to the same artifacts instead of duplicating them. Artifacts
//! written by phases that succeeded before a failure are left in place.

mod progress;

use std::collections::BTreeMap;

use tracing::{info, warn};

use equa_bench_analytics::{compute_global_statistics, native_descriptive, EngineConfig};
use equa_bench_model::{
    AttributeDelta, BenchmarkId, FinalizePhase, JobId, MetricKey, TopPerformerProfile,
};
use equa_bench_stats::round2;
use equa_bench_store::{unix_now, Store, StoreError};

pub const CRATE_NAME: &str = "equa-bench-pipeline";

/// Attributes kept in each ranked top list of a profile.
pub const TOP_ATTRIBUTES_PER_CLASS: usize = 5;

pub use progress::{PipelineEvent, PipelineLog, PipelinePhase};

#[derive(Debug)]
pub struct PipelineError(pub String);

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PipelineError {}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        Self(err.0)
    }
}

#[derive(Debug, Clone)]
pub struct FinalizeOutcome {
    pub benchmark_id: BenchmarkId,
    pub job_id: JobId,
    pub rows_processed: u64,
    pub statistics_written: usize,
    pub profiles_written: usize,
    pub events: Vec<PipelineEvent>,
}

/// Run the finalize pipeline for one benchmark/job pair.
///
/// Unknown identifiers fail without side effects. Any failure past that
/// point marks both the benchmark and the job failed with the captured
/// message and surfaces the same error to the caller.
pub fn run_finalize(
    store: &mut Store,
    benchmark_id: &BenchmarkId,
    job_id: &JobId,
    cfg: EngineConfig,
) -> Result<FinalizeOutcome, PipelineError> {
    let benchmark = store
        .get_benchmark(benchmark_id)?
        .ok_or_else(|| PipelineError(format!("unknown benchmark: {benchmark_id}")))?;
    let job = store
        .get_job(job_id)?
        .ok_or_else(|| PipelineError(format!("unknown job: {job_id}")))?;
    if job.benchmark_id != benchmark.id {
        return Err(PipelineError(format!(
            "job {job_id} does not belong to benchmark {benchmark_id}"
        )));
    }

    store.mark_job_running(job_id)?;
    let mut log = PipelineLog::default();
    log.emit(PipelinePhase::Prepare, "finalize.start", BTreeMap::new());

    match run_phases(store, benchmark_id, job_id, cfg, &mut log) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            warn!(benchmark = %benchmark_id, job = %job_id, error = %err, "finalize failed");
            if let Err(mark_err) = store.mark_benchmark_failed(benchmark_id) {
                warn!(error = %mark_err, "could not mark benchmark failed");
            }
            if let Err(mark_err) = store.fail_job(job_id, &err.0) {
                warn!(error = %mark_err, "could not mark job failed");
            }
            Err(err)
        }
    }
}

fn run_phases(
    store: &mut Store,
    benchmark_id: &BenchmarkId,
    job_id: &JobId,
    cfg: EngineConfig,
    log: &mut PipelineLog,
) -> Result<FinalizeOutcome, PipelineError> {
    let rows = store.count_data_points(benchmark_id, &Default::default())?;
    if rows == 0 {
        return Err(PipelineError(format!(
            "no data points were ingested for benchmark {benchmark_id}"
        )));
    }

    // Phase 1: descriptive statistics, delete-then-recreate the global rows.
    store.job_checkpoint(
        job_id,
        FinalizePhase::Statistics.progress_checkpoint(),
        FinalizePhase::Statistics,
    )?;
    store.delete_statistics(benchmark_id, "")?;
    let statistics = compute_global_statistics(store, benchmark_id, cfg)
        .map_err(|e| PipelineError(e.to_string()))?;
    store.insert_statistics(benchmark_id, "", &statistics)?;
    log.emit(
        PipelinePhase::Statistics,
        "finalize.statistics.complete",
        BTreeMap::from([("metrics".to_string(), statistics.len().to_string())]),
    );
    info!(benchmark = %benchmark_id, metrics = statistics.len(), "statistics phase complete");

    // Phase 2: population baselines the top-performer deltas are taken
    // against. Top-performer profiles cannot be built without these.
    store.job_checkpoint(
        job_id,
        FinalizePhase::Correlations.progress_checkpoint(),
        FinalizePhase::Correlations,
    )?;
    let baselines = compute_population_baselines(store, benchmark_id)?;
    log.emit(
        PipelinePhase::Correlations,
        "finalize.correlations.complete",
        BTreeMap::from([("attributes".to_string(), baselines.len().to_string())]),
    );

    // Phase 3: top-performer profiles per outcome, delete-then-recreate.
    store.job_checkpoint(
        job_id,
        FinalizePhase::TopPerformers.progress_checkpoint(),
        FinalizePhase::TopPerformers,
    )?;
    store.delete_profiles(benchmark_id)?;
    let mut profiles_written = 0;
    for outcome in MetricKey::outcomes() {
        match build_outcome_profile(store, benchmark_id, outcome, cfg, &baselines)? {
            Some(profile) => {
                store.insert_profile(&profile)?;
                profiles_written += 1;
            }
            None => {
                info!(benchmark = %benchmark_id, outcome = %outcome, "outcome has no values, profile skipped");
            }
        }
    }
    log.emit(
        PipelinePhase::TopPerformers,
        "finalize.top_performers.complete",
        BTreeMap::from([("profiles".to_string(), profiles_written.to_string())]),
    );

    // Phase 4: completion.
    store.mark_benchmark_completed(benchmark_id, rows)?;
    store.complete_job(job_id, rows)?;
    log.emit(PipelinePhase::Complete, "finalize.complete", BTreeMap::new());
    info!(benchmark = %benchmark_id, job = %job_id, rows, "finalize complete");

    Ok(FinalizeOutcome {
        benchmark_id: benchmark_id.clone(),
        job_id: job_id.clone(),
        rows_processed: rows,
        statistics_written: statistics.len(),
        profiles_written,
        events: log.events().to_vec(),
    })
}

/// Population mean per competency and talent attribute. Attributes with no
/// values carry no baseline, and deltas against them are not produced.
fn compute_population_baselines(
    store: &Store,
    benchmark_id: &BenchmarkId,
) -> Result<BTreeMap<MetricKey, f64>, PipelineError> {
    let mut baselines = BTreeMap::new();
    for attribute in MetricKey::competencies().chain(MetricKey::talents()) {
        if let Some(mean) = store.population_attribute_mean(benchmark_id, attribute)? {
            baselines.insert(attribute, mean);
        }
    }
    Ok(baselines)
}

/// Ranked attribute deltas of the top-performer segment against the
/// population baselines. Attributes are ranked by segment mean, descending.
fn ranked_segment_attributes(
    store: &Store,
    benchmark_id: &BenchmarkId,
    outcome: MetricKey,
    threshold: f64,
    attributes: impl Iterator<Item = MetricKey>,
    baselines: &BTreeMap<MetricKey, f64>,
) -> Result<Vec<AttributeDelta>, PipelineError> {
    let mut ranked = Vec::new();
    for attribute in attributes {
        let Some(baseline) = baselines.get(&attribute) else {
            continue;
        };
        let Some(segment_mean) =
            store.segment_attribute_mean(benchmark_id, outcome, threshold, attribute)?
        else {
            continue;
        };
        ranked.push(AttributeDelta {
            key: attribute,
            value: round2(segment_mean),
            delta: round2(segment_mean - baseline),
        });
    }
    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.registry_index().cmp(&b.key.registry_index()))
    });
    Ok(ranked)
}

/// Build the global top-performer profile for one outcome: the segment is
/// every data point at or above the outcome's 75th percentile.
fn build_outcome_profile(
    store: &Store,
    benchmark_id: &BenchmarkId,
    outcome: MetricKey,
    cfg: EngineConfig,
    baselines: &BTreeMap<MetricKey, f64>,
) -> Result<Option<TopPerformerProfile>, PipelineError> {
    let Some(descriptive) =
        native_descriptive(store, benchmark_id, outcome, cfg.percentile_method)
            .map_err(|e| PipelineError(e.to_string()))?
    else {
        return Ok(None);
    };
    let threshold = descriptive.p75;
    let sample_size = store.segment_size(benchmark_id, outcome, threshold)?;
    if sample_size == 0 {
        return Ok(None);
    }

    let competencies = ranked_segment_attributes(
        store,
        benchmark_id,
        outcome,
        threshold,
        MetricKey::competencies(),
        baselines,
    )?;
    let mut talents = ranked_segment_attributes(
        store,
        benchmark_id,
        outcome,
        threshold,
        MetricKey::talents(),
        baselines,
    )?;

    let secondary: Vec<AttributeDelta> = talents
        .split_off(talents.len().min(TOP_ATTRIBUTES_PER_CLASS))
        .into_iter()
        .take(TOP_ATTRIBUTES_PER_CLASS)
        .collect();
    let mut top_competencies = competencies;
    top_competencies.truncate(TOP_ATTRIBUTES_PER_CLASS);

    Ok(Some(TopPerformerProfile {
        benchmark_id: benchmark_id.clone(),
        outcome,
        filters: Default::default(),
        sample_size,
        top_competencies,
        top_talents: talents,
        secondary_talents: if secondary.is_empty() {
            None
        } else {
            Some(secondary)
        },
        created_at: unix_now(),
    }))
}
