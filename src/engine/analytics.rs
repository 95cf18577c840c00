//! Spread statistics used to size dollar-neutral spread weights.
//!
//! Standalone helpers for strategy research; the backtest runner does not call them.

use crate::domain::Decimal;

/// Per-period `near - long` spread for aligned price series.
///
/// Extra points on the longer series are ignored.
pub fn spread_series(near: &[Decimal], long: &[Decimal]) -> Vec<Decimal> {
    near.iter().zip(long).map(|(n, l)| *n - *l).collect()
}

/// Mean and sample standard deviation of period-over-period spread changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadStatistics {
    pub mean_return: f64,
    pub std_dev: f64,
}

impl SpreadStatistics {
    /// Needs at least three points (two returns). Periods starting from a
    /// zero spread have no defined return and are skipped.
    pub fn from_series(series: &[f64]) -> Option<Self> {
        let returns: Vec<f64> = series
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();

        if returns.len() < 2 {
            return None;
        }

        let n = returns.len() as f64;
        let mean_return = returns.iter().sum::<f64>() / n;
        let variance = returns
            .iter()
            .map(|r| (r - mean_return).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        Some(Self {
            mean_return,
            std_dev: variance.sqrt(),
        })
    }
}

/// Dollar-neutral `[near, long]` weights; they always sum to zero.
///
/// `w = mean / (2 * std^2 * (1 - correlation))`, clamped to `[-1, 1]`.
pub fn optimize_spread_weights(mean_return: f64, std_dev: f64, correlation: f64) -> [f64; 2] {
    let denominator = 2.0 * std_dev * std_dev * (1.0 - correlation);
    if denominator.is_nan() || denominator <= 0.0 || !mean_return.is_finite() {
        return [0.0, 0.0];
    }

    let w = (mean_return / denominator).clamp(-1.0, 1.0);
    [w, -w]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_spread_series() {
        let near = vec![d("100"), d("105")];
        let long = vec![d("95"), d("102"), d("110")];
        assert_eq!(spread_series(&near, &long), vec![d("5"), d("3")]);
    }

    #[test]
    fn test_statistics_on_rising_series() {
        let stats = SpreadStatistics::from_series(&[100.0, 102.0, 104.0, 103.0, 105.0]).unwrap();
        assert!(stats.mean_return > 0.0);
        assert!(stats.std_dev > 0.0);
    }

    #[test]
    fn test_statistics_needs_two_returns() {
        assert!(SpreadStatistics::from_series(&[1.0, 2.0]).is_none());
        assert!(SpreadStatistics::from_series(&[0.0, 1.0, 2.0]).is_none());
    }

    #[test]
    fn test_weights_sum_to_zero() {
        let weights = optimize_spread_weights(0.01, 0.02, 0.5);
        assert_eq!(weights[0] + weights[1], 0.0);
        assert!(weights[0] > 0.0);
    }

    #[test]
    fn test_weights_clamped() {
        assert_eq!(optimize_spread_weights(10.0, 0.01, 0.0), [1.0, -1.0]);
    }

    #[test]
    fn test_degenerate_inputs_give_flat_weights() {
        assert_eq!(optimize_spread_weights(0.01, 0.0, 0.5), [0.0, 0.0]);
        assert_eq!(optimize_spread_weights(0.01, 0.02, 1.0), [0.0, 0.0]);
    }
}
