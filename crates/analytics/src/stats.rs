//! Descriptive statistics over `f64` samples.
//!
//! All helpers return `0.0` for empty input instead of panicking or
//! producing `NaN`.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
///
/// A constant sample is exactly `0.0`; rounding in the mean would otherwise
/// leave a tiny residual spread.
pub fn population_std_dev(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    if values.iter().all(|&v| v == first) {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// The `q`-quantile using linear interpolation between order statistics
/// (Hyndman & Fan type 7): `pos = q * (n - 1)` over the sorted sample.
///
/// `q` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// Same as [`quantile`] for input that is already sorted ascending.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let fraction = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_degrades_to_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std_dev(&[]), 0.0);
        assert_eq!(quantile(&[], 0.5), 0.0);
        assert_eq!(percentage(3.0, 0.0), 0.0);
    }

    #[test]
    fn constant_sample_has_exactly_zero_spread() {
        assert_eq!(population_std_dev(&[0.1; 10]), 0.0);
        assert_eq!(population_std_dev(&[19.99; 7]), 0.0);
        assert!(population_std_dev(&[0.1, 0.1, 0.2]) > 0.0);
    }

    #[test]
    fn std_dev_is_population_form() {
        // mean 5, squared deviations sum to 32 over 8 values.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let values = [4.0, 1.0, 3.0, 2.0];
        // pos = 0.25 * 3 = 0.75 -> 1 + 0.75 * (2 - 1)
        assert!((quantile(&values, 0.25) - 1.75).abs() < 1e-12);
        // pos = 1.5 -> 2.5
        assert!((quantile(&values, 0.5) - 2.5).abs() < 1e-12);
        // pos = 2.25 -> 3.25
        assert!((quantile(&values, 0.75) - 3.25).abs() < 1e-12);
        assert_eq!(quantile(&values, 1.0), 4.0);
        assert_eq!(quantile(&[7.0], 0.9), 7.0);
    }
}
