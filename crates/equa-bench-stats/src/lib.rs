#![forbid(unsafe_code)]

//! Descriptive statistics over metric populations.
//!
//! Pure functions only: no I/O, no side effects. Empty input is represented
//! by `None`, never by an error. Rounding to two decimals happens at the
//! output boundary (`Descriptive::rounded`), never inside computation.

mod describe;
mod percentiles;

pub const CRATE_NAME: &str = "equa-bench-stats";

pub use describe::{compute_descriptive, stddev_from_sums, Descriptive};
pub use percentiles::{compute_percentile, percentile_of_sorted, rank_index, PercentileMethod};

/// Round to two decimals for the output boundary.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_truncates_to_two_decimals() {
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(2.346), 2.35);
        assert_eq!(round2(50.0), 50.0);
        assert_eq!(round2(-2.346), -2.35);
    }
}
