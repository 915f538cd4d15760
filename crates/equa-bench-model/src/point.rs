use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dimension::Dimension;
use crate::ids::BenchmarkId;
use crate::registry::MetricKey;

/// One respondent record. Immutable once ingested; the analytics engine only
/// reads these, the ingestion collaborator writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: String,
    pub benchmark_id: BenchmarkId,
    #[serde(default)]
    pub dimensions: BTreeMap<Dimension, String>,
    #[serde(default)]
    pub metrics: BTreeMap<MetricKey, f64>,
}

impl DataPoint {
    #[must_use]
    pub fn new(id: impl Into<String>, benchmark_id: BenchmarkId) -> Self {
        Self {
            id: id.into(),
            benchmark_id,
            dimensions: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.dimensions.insert(dimension, value.into());
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: MetricKey, value: f64) -> Self {
        self.metrics.insert(metric, value);
        self
    }

    #[must_use]
    pub fn metric(&self, metric: MetricKey) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    #[must_use]
    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        self.dimensions.get(&dimension).map(String::as_str)
    }
}
