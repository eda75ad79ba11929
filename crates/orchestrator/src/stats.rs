//! Percentile and win-rate helpers shared by the batch modes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert Decimal to f64 for statistics.
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Nearest-rank percentile over unsorted input; `p` in [0, 1].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let index = ((sorted.len() - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 0.5)
}

/// Fraction of strictly positive values.
pub fn win_rate(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v > 0.0).count() as f64 / values.len() as f64
}

/// Fraction of strictly negative values.
pub fn loss_rate(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v < 0.0).count() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles() {
        let values = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(median(&values), 3.0);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 5.0);
        // Index round(4 * 0.1) = 0 -> lowest value.
        assert_eq!(percentile(&values, 0.1), 1.0);
        assert_eq!(percentile(&values, 0.9), 5.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn test_win_and_loss_rates() {
        let values = vec![2.0, -1.0, 0.0, 3.0];
        assert_eq!(win_rate(&values), 0.5);
        assert_eq!(loss_rate(&values), 0.25);
    }
}
