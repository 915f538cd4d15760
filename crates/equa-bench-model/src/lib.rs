#![forbid(unsafe_code)]

mod benchmark;
mod dimension;
mod filter;
mod ids;
mod job;
mod point;
mod profile;
mod registry;
mod statistic;

pub const CRATE_NAME: &str = "equa-bench-model";

pub use benchmark::{Benchmark, BenchmarkStatus};
pub use dimension::Dimension;
pub use filter::DimensionFilter;
pub use ids::{BenchmarkId, JobId, ValidationError};
pub use job::{FinalizePhase, JobStatus, UploadJob};
pub use point::DataPoint;
pub use profile::{
    AttributeDelta, ConfidenceLevel, EnrichedProfile, TopPerformerProfile,
    CONFIDENCE_HIGH_MIN_SAMPLE, CONFIDENCE_MEDIUM_MIN_SAMPLE,
};
pub use registry::{MetricClass, MetricKey};
pub use statistic::{GroupStatistics, MetricStatistic};
