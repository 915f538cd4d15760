// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use equa_bench_model::{
    BenchmarkId, Dimension, DimensionFilter, JobId, MetricClass, MetricKey,
};
use serde::Deserialize;

use crate::errors::ApiError;

/// Query-parameter names that are not dimension filters.
const RESERVED_PARAMS: [&str; 3] = ["group_by", "outcome", "pretty"];

/// Turn dimension-named query parameters into a filter. Unknown parameter
/// names are a client error; nothing is computed past this point.
pub fn parse_filter_params(query: &BTreeMap<String, String>) -> Result<DimensionFilter, ApiError> {
    let mut filter = DimensionFilter::new();
    for (key, value) in query {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        let dimension =
            Dimension::parse(key).map_err(|_| ApiError::unknown_dimension(key))?;
        if value.trim().is_empty() {
            return Err(ApiError::invalid_param(key, value));
        }
        filter.insert(dimension, value.trim());
    }
    Ok(filter)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsParams {
    pub filter: DimensionFilter,
}

pub fn parse_stats_params(query: &BTreeMap<String, String>) -> Result<StatsParams, ApiError> {
    if query.contains_key("group_by") || query.contains_key("outcome") {
        let name = if query.contains_key("group_by") {
            "group_by"
        } else {
            "outcome"
        };
        return Err(ApiError::invalid_param(name, "not valid for this endpoint"));
    }
    Ok(StatsParams {
        filter: parse_filter_params(query)?,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedParams {
    pub group_by: Dimension,
    pub filter: DimensionFilter,
}

pub fn parse_grouped_params(query: &BTreeMap<String, String>) -> Result<GroupedParams, ApiError> {
    let raw = query
        .get("group_by")
        .ok_or_else(|| ApiError::missing_param("group_by"))?;
    let group_by = Dimension::parse(raw).map_err(|_| ApiError::unknown_dimension(raw))?;
    if !Dimension::groupable().contains(&group_by) {
        return Err(ApiError::invalid_param("group_by", raw));
    }
    Ok(GroupedParams {
        group_by,
        filter: parse_filter_params(query)?,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopPerformerParams {
    pub outcome: MetricKey,
    pub filter: DimensionFilter,
}

pub fn parse_top_performer_params(
    query: &BTreeMap<String, String>,
) -> Result<TopPerformerParams, ApiError> {
    let raw = query
        .get("outcome")
        .ok_or_else(|| ApiError::missing_param("outcome"))?;
    let outcome = MetricKey::parse(raw).map_err(|_| ApiError::unknown_metric(raw))?;
    if outcome.class() != MetricClass::Outcome {
        return Err(ApiError::invalid_param("outcome", raw));
    }
    Ok(TopPerformerParams {
        outcome,
        filter: parse_filter_params(query)?,
    })
}

/// Body of `POST /v1/benchmarks/finalize-upload`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalizeBody {
    pub benchmark_id: String,
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeParams {
    pub benchmark_id: BenchmarkId,
    pub job_id: JobId,
}

pub fn parse_finalize_body(body: &serde_json::Value) -> Result<FinalizeParams, ApiError> {
    let body: FinalizeBody = serde_json::from_value(body.clone())
        .map_err(|e| ApiError::invalid_param("body", &e.to_string()))?;
    let benchmark_id = BenchmarkId::parse(&body.benchmark_id)
        .map_err(|_| ApiError::invalid_param("benchmark_id", &body.benchmark_id))?;
    let job_id = JobId::parse(&body.job_id)
        .map_err(|_| ApiError::invalid_param("job_id", &body.job_id))?;
    Ok(FinalizeParams {
        benchmark_id,
        job_id,
    })
}

pub fn parse_benchmark_id(raw: &str) -> Result<BenchmarkId, ApiError> {
    BenchmarkId::parse(raw).map_err(|_| ApiError::invalid_param("benchmark_id", raw))
}
