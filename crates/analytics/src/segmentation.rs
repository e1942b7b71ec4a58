//! Fixed-ratio value segmentation.
//!
//! Bands are defined as multiples of the average customer mean spend, not the
//! quantile thresholds used by [`crate::rfm`]. The two produce different
//! distributions and both are reported.

use crate::customers::CustomerAggregate;
use crate::stats;

/// Lower bounds as a fraction of the average, highest band first. Customers
/// below the last bound are `occasional`.
const VALUE_BANDS: [(&str, f64); 3] = [("premium", 1.5), ("standard", 0.75), ("budget", 0.4)];
const LOWEST_BAND: &str = "occasional";

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentBucket {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    /// Average of the members' mean transaction values; 0 for an empty band.
    pub avg_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueSegmentation {
    /// Always four buckets: premium, standard, budget, occasional.
    pub segments: Vec<SegmentBucket>,
    /// The average of customer mean spends the bands are scaled from.
    pub average_value: f64,
    pub total_customers: usize,
}

pub fn value_segments(customers: &[CustomerAggregate]) -> ValueSegmentation {
    let means: Vec<f64> = customers.iter().map(|c| c.monetary).collect();
    let average_value = stats::mean(&means);

    let labels = VALUE_BANDS.iter().map(|(label, _)| *label).chain([LOWEST_BAND]);
    let mut totals: Vec<(&str, usize, f64)> = labels.map(|label| (label, 0, 0.0)).collect();

    for &value in &means {
        let index = VALUE_BANDS
            .iter()
            .position(|(_, ratio)| value >= average_value * ratio)
            .unwrap_or(VALUE_BANDS.len());
        totals[index].1 += 1;
        totals[index].2 += value;
    }

    let total_customers = customers.len();
    ValueSegmentation {
        segments: totals
            .into_iter()
            .map(|(label, count, sum)| SegmentBucket {
                label: label.to_string(),
                count,
                percentage: stats::percentage(count as f64, total_customers as f64),
                avg_value: sum / count.max(1) as f64,
            })
            .collect(),
        average_value,
        total_customers,
    }
}
