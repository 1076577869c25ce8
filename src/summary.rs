// 📦 Distribution Summarizer - box-and-whisker statistics for one category
//
// Quartiles use linear interpolation between closest ranks (numpy's default
// percentile method, which matplotlib box plots are drawn from): the p-th
// quantile sits at index p * (n - 1) of the sorted sample.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Fence distance in multiples of the inter-quartile range
pub const WHISKER_IQR_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Smallest data point not below `lower_fence`
    pub whisker_low: f64,
    /// Largest data point not above `upper_fence`
    pub whisker_high: f64,
    /// Points outside the fences, ascending
    pub outliers: Vec<f64>,
}

impl DistributionSummary {
    pub fn has_outliers(&self) -> bool {
        !self.outliers.is_empty()
    }

    /// True if `value` falls outside the fences
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_fence || value > self.upper_fence
    }

    /// One-line human summary, used by the CLI and the TUI status bar
    pub fn describe(&self) -> String {
        format!(
            "{}: n={}, min={}, Q1={}, median={}, Q3={}, max={}, outliers={}",
            self.category,
            self.count,
            round2(self.min),
            round2(self.q1),
            round2(self.median),
            round2(self.q3),
            round2(self.max),
            self.outliers.len()
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarize the amounts of one category.
///
/// Fails with `EmptyCategory` when there is nothing to summarize.
pub fn summarize(category: &str, amounts: &[f64]) -> Result<DistributionSummary> {
    if amounts.is_empty() {
        return Err(LedgerError::EmptyCategory(category.to_string()));
    }

    let mut sorted = amounts.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&sorted, 0.25);
    let median = median(&sorted);
    let q3 = quantile(&sorted, 0.75);

    let iqr = q3 - q1;
    let lower_fence = q1 - WHISKER_IQR_FACTOR * iqr;
    let upper_fence = q3 + WHISKER_IQR_FACTOR * iqr;

    let in_fence = |v: f64| v >= lower_fence && v <= upper_fence;

    // Q1..Q3 always holds at least one data point, so both fall back only
    // in degenerate float cases.
    let whisker_low = sorted.iter().copied().find(|v| in_fence(*v)).unwrap_or(q1);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| in_fence(*v))
        .unwrap_or(q3);

    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| !in_fence(*v))
        .collect();

    Ok(DistributionSummary {
        category: category.to_string(),
        count: sorted.len(),
        min: sorted[0],
        q1,
        median,
        q3,
        max: sorted[sorted.len() - 1],
        iqr,
        lower_fence,
        upper_fence,
        whisker_low,
        whisker_high,
        outliers,
    })
}

/// Median of an ascending, non-empty slice
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        let (a, b) = (sorted[n / 2 - 1], sorted[n / 2]);
        // halve the gap, not the sum, so large amounts cannot overflow
        a + (b - a) / 2.0
    }
}

/// Quantile `p` (0..=1) of an ascending, non-empty slice with linear
/// interpolation between the two nearest ranks.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_three_food_expenses() {
        let summary = summarize("Food", &[10.0, 20.0, 30.0]).unwrap();

        assert_eq!(summary.median, 20.0);
        assert_eq!(summary.q1, 15.0);
        assert_eq!(summary.q3, 25.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 30.0);
        assert_eq!(summary.lower_fence, 0.0);
        assert_eq!(summary.upper_fence, 40.0);
        assert!(summary.outliers.is_empty());
    }

    #[test]
    fn test_single_value() {
        let summary = summarize("Fuel", &[42.5]).unwrap();

        for value in [
            summary.min,
            summary.q1,
            summary.median,
            summary.q3,
            summary.max,
            summary.whisker_low,
            summary.whisker_high,
        ] {
            assert_eq!(value, 42.5);
        }
        assert_eq!(summary.iqr, 0.0);
        assert!(summary.outliers.is_empty());
    }

    #[test]
    fn test_empty_amounts() {
        assert_eq!(
            summarize("Travel", &[]).unwrap_err(),
            LedgerError::EmptyCategory("Travel".to_string())
        );
    }

    #[test]
    fn test_even_count_interpolates() {
        let summary = summarize("Food", &[4.0, 1.0, 3.0, 2.0]).unwrap();

        assert_close(summary.median, 2.5);
        assert_close(summary.q1, 1.75);
        assert_close(summary.q3, 3.25);
    }

    #[test]
    fn test_outlier_detection_and_whiskers() {
        let summary = summarize("Food", &[3.0, 1.0, 100.0, 2.0, 4.0]).unwrap();

        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.upper_fence, 7.0);
        assert_eq!(summary.lower_fence, -1.0);
        assert_eq!(summary.outliers, vec![100.0]);
        assert_eq!(summary.whisker_high, 4.0);
        assert_eq!(summary.whisker_low, 1.0);
        assert_eq!(summary.max, 100.0);
        assert!(summary.has_outliers());
        assert!(summary.is_outlier(100.0));
        assert!(!summary.is_outlier(4.0));
    }

    #[test]
    fn test_low_outliers_sorted_ascending() {
        let summary = summarize(
            "Rent",
            &[-500.0, 10.0, 11.0, 12.0, 13.0, -400.0, 14.0, 15.0, 16.0, 17.0, 18.0],
        )
        .unwrap();

        assert_eq!(summary.outliers, vec![-500.0, -400.0]);
        assert_eq!(summary.whisker_low, 10.0);
    }

    #[test]
    fn test_value_on_fence_is_not_outlier() {
        // q1 = 1, q3 = 2, upper fence = 3.5
        let summary = summarize("Edge", &[1.0, 1.0, 2.0, 2.0, 3.5]).unwrap();
        assert_eq!(summary.upper_fence, 3.5);
        assert!(summary.outliers.is_empty());
        assert_eq!(summary.whisker_high, 3.5);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = summarize("Food", &[5.0, 1.0, 9.0, 3.0]).unwrap();
        let b = summarize("Food", &[1.0, 3.0, 5.0, 9.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_median_of_huge_amounts_stays_finite() {
        let summary = summarize("Big", &[1.0e308, 1.5e308]).unwrap();

        assert!(summary.median.is_finite());
        assert!((summary.median - 1.25e308).abs() <= 1.25e308 * 1e-12);
        assert!(summary.q1 <= summary.median && summary.median <= summary.q3);
    }

    #[test]
    fn test_quantile_bounds() {
        let sorted = [1.0, 2.0, 3.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 3.0);
        assert_eq!(quantile(&sorted, 0.5), 2.0);
    }

    #[test]
    fn test_describe() {
        let summary = summarize("Food", &[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(
            summary.describe(),
            "Food: n=3, min=10, Q1=15, median=20, Q3=25, max=30, outliers=0"
        );
    }
}
