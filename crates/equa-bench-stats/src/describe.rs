use crate::percentiles::{percentile_of_sorted, PercentileMethod};
use crate::round2;

/// Full descriptive summary of one metric population. Unrounded; call
/// [`Descriptive::rounded`] at the output boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptive {
    pub n: u64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

impl Descriptive {
    /// Copy with every value rounded to two decimals.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            n: self.n,
            mean: round2(self.mean),
            median: round2(self.median),
            std_dev: round2(self.std_dev),
            min: round2(self.min),
            max: round2(self.max),
            p10: round2(self.p10),
            p25: round2(self.p25),
            p50: round2(self.p50),
            p75: round2(self.p75),
            p90: round2(self.p90),
            p95: round2(self.p95),
        }
    }
}

/// Sample standard deviation (n-1 divisor) from streaming sums, for paths
/// that aggregate in storage instead of materializing values. Returns 0 for
/// fewer than two samples; clamps tiny negative variance from float error.
#[must_use]
pub fn stddev_from_sums(n: u64, sum: f64, sum_squares: f64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let variance = (sum_squares - (sum * sum) / nf) / (nf - 1.0);
    if variance <= 0.0 {
        0.0
    } else {
        variance.sqrt()
    }
}

/// Compute the descriptive summary of the non-null values of one metric.
///
/// Returns `None` for an empty population: absence of data is omission, not
/// an error. Standard deviation is the sample deviation (n-1), matching
/// [`stddev_from_sums`] so both computation strategies agree.
#[must_use]
pub fn compute_descriptive(values: &[f64], method: PercentileMethod) -> Option<Descriptive> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std_dev = if n < 2 {
        0.0
    } else {
        let variance =
            sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    };

    let p50 = percentile_of_sorted(&sorted, 50.0, method);
    Some(Descriptive {
        n: n as u64,
        mean,
        median: p50,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        p10: percentile_of_sorted(&sorted, 10.0, method),
        p25: percentile_of_sorted(&sorted, 25.0, method),
        p50,
        p75: percentile_of_sorted(&sorted, 75.0, method),
        p90: percentile_of_sorted(&sorted, 90.0, method),
        p95: percentile_of_sorted(&sorted, 95.0, method),
    })
}
