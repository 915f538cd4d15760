// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Stable machine-readable error codes of the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorCode {
    InvalidQueryParameter,
    MissingParameter,
    UnknownDimension,
    UnknownMetric,
    UnknownBenchmark,
    UnknownJob,
    QueryRejectedByPolicy,
    Timeout,
    NotReady,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"parameter": name, "value": value}),
        )
    }

    #[must_use]
    pub fn missing_param(name: &str) -> Self {
        Self::new(
            ApiErrorCode::MissingParameter,
            format!("missing required parameter: {name}"),
            json!({"parameter": name}),
        )
    }

    #[must_use]
    pub fn unknown_dimension(name: &str) -> Self {
        Self::new(
            ApiErrorCode::UnknownDimension,
            format!("unknown dimension: {name}"),
            json!({"dimension": name}),
        )
    }

    #[must_use]
    pub fn unknown_metric(name: &str) -> Self {
        Self::new(
            ApiErrorCode::UnknownMetric,
            format!("unknown metric: {name}"),
            json!({"metric": name}),
        )
    }

    #[must_use]
    pub fn unknown_benchmark(id: &str) -> Self {
        Self::new(
            ApiErrorCode::UnknownBenchmark,
            format!("unknown benchmark: {id}"),
            json!({"benchmark_id": id}),
        )
    }

    #[must_use]
    pub fn unknown_job(id: &str) -> Self {
        Self::new(
            ApiErrorCode::UnknownJob,
            format!("unknown job: {id}"),
            json!({"job_id": id}),
        )
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
};
