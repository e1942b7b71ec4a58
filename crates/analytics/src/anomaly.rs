use crate::error::AnalyticsError;
use crate::stats;
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use core_types::Transaction;
use std::collections::BTreeMap;

pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

pub(crate) const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Value bands for the anomaly breakdown: `<100`, `100-1000`, `>=1000`.
const VALUE_BANDS: [&str; 3] = ["<100", "100-1000", ">=1000"];

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRecord {
    pub transaction_id: String,
    pub customer_id: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
}

/// Anomalous-transaction counts, grouped by one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    /// Every transaction with its score, in input order.
    pub records: Vec<AnomalyRecord>,
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
    pub anomaly_count: usize,
    /// All 24 hours, ascending.
    pub by_hour: Vec<Breakdown>,
    /// All seven weekdays, Monday first.
    pub by_weekday: Vec<Breakdown>,
    /// Payment methods seen among anomalies, sorted by name.
    pub by_payment_method: Vec<Breakdown>,
    /// All three value bands, ascending.
    pub by_value_band: Vec<Breakdown>,
}

impl AnomalyReport {
    pub fn anomalies(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.records.iter().filter(|r| r.is_anomaly)
    }

    pub fn anomaly_rate(&self) -> f64 {
        stats::percentage(self.anomaly_count as f64, self.records.len() as f64) / 100.0
    }
}

/// Flags transactions whose value lies more than `threshold` population
/// standard deviations from the mean of the window.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self { threshold: DEFAULT_Z_THRESHOLD }
    }
}

impl AnomalyDetector {
    pub fn new(threshold: f64) -> Result<Self, AnalyticsError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(AnalyticsError::InvalidSetting(
                "anomaly_z_threshold",
                format!("must be a positive number, got {threshold}"),
            ));
        }
        Ok(Self { threshold })
    }

    pub fn detect(&self, transactions: &[Transaction]) -> AnomalyReport {
        let values: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
        let mean = stats::mean(&values);
        let std_dev = stats::population_std_dev(&values);

        let records: Vec<AnomalyRecord> = transactions
            .iter()
            .map(|t| {
                // A flat window has no spread to measure against.
                let z_score = if std_dev > 0.0 { (t.amount - mean).abs() / std_dev } else { 0.0 };
                AnomalyRecord {
                    transaction_id: t.transaction_id.clone(),
                    customer_id: t.customer_id.clone(),
                    timestamp: t.timestamp,
                    value: t.amount,
                    z_score,
                    is_anomaly: z_score > self.threshold,
                }
            })
            .collect();

        let mut by_hour = [0usize; 24];
        let mut by_weekday = [0usize; 7];
        let mut by_band = [0usize; 3];
        let mut by_payment: BTreeMap<&str, usize> = BTreeMap::new();

        for (record, txn) in records.iter().zip(transactions) {
            if !record.is_anomaly {
                continue;
            }
            by_hour[record.timestamp.hour() as usize] += 1;
            by_weekday[record.timestamp.weekday().num_days_from_monday() as usize] += 1;
            by_band[value_band_index(record.value)] += 1;
            let method = txn.payment_method.as_deref().unwrap_or("Unknown");
            *by_payment.entry(method).or_default() += 1;
        }

        AnomalyReport {
            anomaly_count: by_hour.iter().sum(),
            by_hour: by_hour
                .iter()
                .enumerate()
                .map(|(hour, &count)| Breakdown { key: hour.to_string(), count })
                .collect(),
            by_weekday: WEEKDAYS
                .iter()
                .zip(by_weekday)
                .map(|(day, count)| Breakdown { key: day.to_string(), count })
                .collect(),
            by_payment_method: by_payment
                .into_iter()
                .map(|(method, count)| Breakdown { key: method.to_string(), count })
                .collect(),
            by_value_band: VALUE_BANDS
                .iter()
                .zip(by_band)
                .map(|(band, count)| Breakdown { key: band.to_string(), count })
                .collect(),
            records,
            mean,
            std_dev,
            threshold: self.threshold,
        }
    }
}

fn value_band_index(value: f64) -> usize {
    if value < 100.0 {
        0
    } else if value < 1000.0 {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::tests::txn;

    #[test]
    fn flat_window_flags_nothing() {
        let txns: Vec<_> = (0..10).map(|i| txn(&i.to_string(), "C", 42.0, "2024-01-01")).collect();
        let report = AnomalyDetector::default().detect(&txns);

        assert_eq!(report.std_dev, 0.0);
        assert_eq!(report.anomaly_count, 0);
        assert_eq!(report.anomalies().count(), 0);
        assert!(report.records.iter().all(|r| r.z_score == 0.0));
    }

    #[test]
    fn flat_window_of_inexact_values_flags_nothing() {
        // 0.1 has no exact binary form, so the summed mean drifts from it.
        let txns: Vec<_> = (0..10).map(|i| txn(&i.to_string(), "C", 0.1, "2024-01-01")).collect();
        let report = AnomalyDetector::default().detect(&txns);

        assert_eq!(report.std_dev, 0.0);
        assert_eq!(report.anomaly_count, 0);
        assert!(report.records.iter().all(|r| r.z_score == 0.0));
    }

    #[test]
    fn flags_outlier_beyond_threshold() {
        let mut txns: Vec<_> = (0..19).map(|i| txn(&i.to_string(), "C", 50.0, "2024-01-01")).collect();
        let mut outlier = txn("big", "X", 5000.0, "2024-01-03");
        outlier.payment_method = Some("Card".to_string());
        outlier.timestamp = outlier.timestamp + chrono::Duration::hours(14);
        txns.push(outlier);

        let report = AnomalyDetector::default().detect(&txns);
        let flagged: Vec<_> = report.anomalies().collect();

        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].transaction_id, "big");
        // A single outlier among n values scores z = sqrt(n - 1).
        assert!((flagged[0].z_score - 19f64.sqrt()).abs() < 1e-9);
        assert!((report.anomaly_rate() - 0.05).abs() < 1e-12);

        assert_eq!(report.by_hour.len(), 24);
        assert_eq!(report.by_hour[14].count, 1);
        // 2024-01-03 is a Wednesday.
        assert_eq!(report.by_weekday[2], Breakdown { key: "Wed".to_string(), count: 1 });
        assert_eq!(report.by_payment_method, vec![Breakdown { key: "Card".to_string(), count: 1 }]);
        assert_eq!(report.by_value_band[2].count, 1);
        assert_eq!(report.by_value_band[0].count, 0);
    }

    #[test]
    fn threshold_is_strict_and_configurable() {
        // Values 0 and 10: mean 5, std 5, every z-score is exactly 1.
        let txns = vec![txn("a", "C", 0.0, "2024-01-01"), txn("b", "C", 10.0, "2024-01-01")];
        let at_one = AnomalyDetector::new(1.0).unwrap().detect(&txns);
        assert_eq!(at_one.anomaly_count, 0);

        let below_one = AnomalyDetector::new(0.5).unwrap().detect(&txns);
        assert_eq!(below_one.anomaly_count, 2);

        assert!(AnomalyDetector::new(0.0).is_err());
        assert!(AnomalyDetector::new(f64::NAN).is_err());
    }

    #[test]
    fn empty_window_is_zeroed() {
        let report = AnomalyDetector::default().detect(&[]);
        assert!(report.records.is_empty());
        assert_eq!(report.anomaly_rate(), 0.0);
        assert_eq!(report.by_weekday.len(), 7);
        assert!(report.by_payment_method.is_empty());
    }
}
