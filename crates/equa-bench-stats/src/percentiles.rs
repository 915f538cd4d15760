//! Percentile computation.
//!
//! Two rank definitions exist in the wild for this engine's data: the
//! canonical nearest-rank selection and linear interpolation between ranks.
//! Both are implemented explicitly so the storage-side and in-memory
//! strategies can be pinned to the same definition.

/// How a percentile rank maps onto sorted sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PercentileMethod {
    /// Sort ascending, take the value at index `floor(p/100 * (n-1))`.
    /// No interpolation. This is the canonical definition.
    #[default]
    NearestRank,
    /// Linear interpolation between the two ranks surrounding
    /// `p/100 * (n-1)`.
    Linear,
}

/// Zero-based nearest-rank index for percentile `p` over `n` samples.
#[must_use]
pub fn rank_index(p: f64, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let idx = ((p / 100.0) * (n - 1) as f64).floor();
    (idx as usize).min(n - 1)
}

/// Percentile of an ascending-sorted, non-empty slice.
#[must_use]
pub fn percentile_of_sorted(sorted: &[f64], p: f64, method: PercentileMethod) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let n = sorted.len();
    match method {
        PercentileMethod::NearestRank => sorted[rank_index(p, n)],
        PercentileMethod::Linear => {
            let rank = (p / 100.0) * (n - 1) as f64;
            let lower_idx = rank.floor() as usize;
            let upper_idx = (lower_idx + 1).min(n - 1);
            let fraction = rank - lower_idx as f64;
            sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
        }
    }
}

/// Percentile of unsorted samples. Sorts a copy; callers computing several
/// percentiles should sort once and use [`percentile_of_sorted`].
#[must_use]
pub fn compute_percentile(samples: &[f64], p: f64, method: PercentileMethod) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    percentile_of_sorted(&sorted, p, method)
}
