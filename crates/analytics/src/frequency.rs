use crate::customers::CustomerAggregate;
use crate::stats;
use std::collections::BTreeMap;

/// Multiplier on the mean purchase count above which a customer is "high frequency".
pub const HIGH_FREQUENCY_RATIO: f64 = 1.5;
/// Multiplier on the mean purchase count below which a customer is "low frequency".
pub const LOW_FREQUENCY_RATIO: f64 = 0.5;

/// Upper bounds (inclusive, in days) of the purchase-interval bins. Anything
/// above the last bound falls into the open-ended `90+` bin.
const INTERVAL_BINS: [(f64, &str); 5] = [
    (7.0, "0-7"),
    (14.0, "8-14"),
    (30.0, "15-30"),
    (60.0, "31-60"),
    (90.0, "61-90"),
];
const OPEN_INTERVAL_BIN: &str = "90+";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyBucket {
    pub frequency: u32,
    pub count: usize,
}

/// How many customers made exactly N purchases, plus summary thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyDistribution {
    /// Ascending by `frequency`.
    pub buckets: Vec<FrequencyBucket>,
    pub total_customers: usize,
    pub mean: f64,
    pub high_threshold: f64,
    pub low_threshold: f64,
    /// Customers strictly above `high_threshold`.
    pub high_count: usize,
    /// Customers strictly below `low_threshold`.
    pub low_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalBin {
    pub range: String,
    pub count: usize,
}

/// Distribution of the average days between a customer's purchases.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRegularity {
    /// Always the six bins, in ascending order.
    pub bins: Vec<IntervalBin>,
    /// Customers with at least two purchases.
    pub repeat_customers: usize,
    pub mean_interval: f64,
    pub median_interval: f64,
}

pub fn frequency_distribution(customers: &[CustomerAggregate]) -> FrequencyDistribution {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for customer in customers {
        *counts.entry(customer.frequency).or_default() += 1;
    }

    let frequencies: Vec<f64> = customers.iter().map(|c| c.frequency as f64).collect();
    let mean = stats::mean(&frequencies);
    let high_threshold = mean * HIGH_FREQUENCY_RATIO;
    let low_threshold = (mean * LOW_FREQUENCY_RATIO).max(1.0);

    FrequencyDistribution {
        buckets: counts
            .into_iter()
            .map(|(frequency, count)| FrequencyBucket { frequency, count })
            .collect(),
        total_customers: customers.len(),
        mean,
        high_threshold,
        low_threshold,
        high_count: frequencies.iter().filter(|&&f| f > high_threshold).count(),
        low_count: frequencies.iter().filter(|&&f| f < low_threshold).count(),
    }
}

pub fn purchase_regularity(customers: &[CustomerAggregate]) -> PurchaseRegularity {
    let intervals: Vec<f64> = customers.iter().filter_map(|c| c.avg_interval_days).collect();

    let mut bins: Vec<IntervalBin> = INTERVAL_BINS
        .iter()
        .map(|(_, label)| label)
        .chain(std::iter::once(&OPEN_INTERVAL_BIN))
        .map(|label| IntervalBin { range: label.to_string(), count: 0 })
        .collect();

    for &interval in &intervals {
        let index = INTERVAL_BINS
            .iter()
            .position(|(upper, _)| interval <= *upper)
            .unwrap_or(INTERVAL_BINS.len());
        bins[index].count += 1;
    }

    PurchaseRegularity {
        bins,
        repeat_customers: intervals.len(),
        mean_interval: stats::mean(&intervals),
        median_interval: stats::median(&intervals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::aggregate_customers;
    use crate::customers::tests::{date, txn};

    #[test]
    fn buckets_customers_by_purchase_count() {
        let txns = vec![
            txn("1", "C1", 50.0, "2024-01-01"),
            txn("2", "C1", 150.0, "2024-02-01"),
            txn("3", "C2", 50.0, "2024-01-15"),
        ];
        let customers = aggregate_customers(&txns, date("2024-02-01"));
        let dist = frequency_distribution(&customers);

        assert_eq!(
            dist.buckets,
            vec![
                FrequencyBucket { frequency: 1, count: 1 },
                FrequencyBucket { frequency: 2, count: 1 },
            ]
        );
        assert_eq!(dist.mean, 1.5);
        assert_eq!(dist.high_threshold, 2.25);
        assert_eq!(dist.low_threshold, 1.0);
        assert_eq!(dist.high_count, 0);
        assert_eq!(dist.low_count, 0);
        assert_eq!(dist.total_customers, 2);
    }

    #[test]
    fn high_frequency_customers_are_counted() {
        let mut txns: Vec<_> = (0..9)
            .map(|i| txn(&format!("a{i}"), "HEAVY", 10.0, &format!("2024-01-{:02}", i + 1)))
            .collect();
        txns.push(txn("b", "LIGHT1", 10.0, "2024-01-01"));
        txns.push(txn("c", "LIGHT2", 10.0, "2024-01-01"));
        let customers = aggregate_customers(&txns, date("2024-01-31"));
        let dist = frequency_distribution(&customers);

        // mean = 11 / 3: high threshold 5.5, low threshold 1.83
        assert_eq!(dist.high_count, 1);
        assert_eq!(dist.low_count, 2);
    }

    #[test]
    fn empty_input_is_zeroed() {
        let dist = frequency_distribution(&[]);
        assert!(dist.buckets.is_empty());
        assert_eq!(dist.mean, 0.0);
        assert_eq!(dist.low_threshold, 1.0);

        let regularity = purchase_regularity(&[]);
        assert_eq!(regularity.bins.len(), 6);
        assert!(regularity.bins.iter().all(|b| b.count == 0));
        assert_eq!(regularity.mean_interval, 0.0);
    }

    #[test]
    fn intervals_land_in_inclusive_bins() {
        let txns = vec![
            // 7-day gap -> "0-7"
            txn("1", "A", 1.0, "2024-01-01"),
            txn("2", "A", 1.0, "2024-01-08"),
            // 31-day gap -> "31-60"
            txn("3", "B", 1.0, "2024-01-01"),
            txn("4", "B", 1.0, "2024-02-01"),
            // 120-day gap -> "90+"
            txn("5", "C", 1.0, "2024-01-01"),
            txn("6", "C", 1.0, "2024-04-30"),
            // single purchase, ignored
            txn("7", "D", 1.0, "2024-01-01"),
        ];
        let customers = aggregate_customers(&txns, date("2024-05-01"));
        let regularity = purchase_regularity(&customers);

        let count = |label: &str| regularity.bins.iter().find(|b| b.range == label).unwrap().count;
        assert_eq!(count("0-7"), 1);
        assert_eq!(count("31-60"), 1);
        assert_eq!(count("90+"), 1);
        assert_eq!(count("8-14"), 0);
        assert_eq!(regularity.repeat_customers, 3);
        assert_eq!(regularity.median_interval, 31.0);
    }
}
