use crate::anomaly::{AnomalyDetector, AnomalyReport, DEFAULT_Z_THRESHOLD};
use crate::association::{AssociationMiner, AssociationRule, baskets_from_transactions};
use crate::churn::{ChurnAnalysis, ChurnScorer, DEFAULT_HORIZON_DAYS};
use crate::customers::aggregate_customers;
use crate::error::AnalyticsError;
use crate::frequency::{FrequencyDistribution, PurchaseRegularity, frequency_distribution, purchase_regularity};
use crate::product::{ProductPerformance, product_performance};
use crate::rfm::{RfmAnalysis, rfm_segments};
use crate::segmentation::{ValueSegmentation, value_segments};
use crate::temporal::{HeatmapCell, TransactionStats, temporal_heatmap, transaction_stats};
use chrono::NaiveDate;
use core_types::{CustomerActivity, PerformanceMetric, ProductSalesRow, Transaction};

/// Tunable parameters for the engine's detectors and miners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticsSettings {
    pub anomaly_z_threshold: f64,
    pub association_min_support: f64,
    pub association_min_lift: f64,
    pub association_max_rules: usize,
    pub churn_horizon_days: u32,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            anomaly_z_threshold: DEFAULT_Z_THRESHOLD,
            association_min_support: 0.01,
            association_min_lift: 1.0,
            association_max_rules: 50,
            churn_horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseFrequencyReport {
    pub frequency_distribution: FrequencyDistribution,
    pub purchase_regularity: PurchaseRegularity,
    pub value_segments: ValueSegmentation,
    pub rfm: RfmAnalysis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPatternsReport {
    pub stats: TransactionStats,
    pub heatmap: Vec<HeatmapCell>,
    pub associations: Vec<AssociationRule>,
}

/// A stateless calculator turning row sets into chart-ready aggregates.
///
/// Holds only its configured thresholds, so one instance can be shared
/// across requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine {
    anomaly: AnomalyDetector,
    association: AssociationMiner,
    churn: ChurnScorer,
}

impl AnalyticsEngine {
    pub fn new(settings: &AnalyticsSettings) -> Result<Self, AnalyticsError> {
        Ok(Self {
            anomaly: AnomalyDetector::new(settings.anomaly_z_threshold)?,
            association: AssociationMiner::new(
                settings.association_min_support,
                settings.association_min_lift,
                settings.association_max_rules,
            )?,
            churn: ChurnScorer::new(settings.churn_horizon_days)?,
        })
    }

    /// Frequency, regularity, value bands and RFM for the customers in
    /// `transactions`. Recency is measured against `reference`.
    pub fn purchase_frequency(&self, transactions: &[Transaction], reference: NaiveDate) -> PurchaseFrequencyReport {
        let customers = aggregate_customers(transactions, reference);
        tracing::debug!(
            transactions = transactions.len(),
            customers = customers.len(),
            "Computing purchase frequency"
        );
        PurchaseFrequencyReport {
            frequency_distribution: frequency_distribution(&customers),
            purchase_regularity: purchase_regularity(&customers),
            value_segments: value_segments(&customers),
            rfm: rfm_segments(&customers),
        }
    }

    pub fn transaction_patterns(&self, transactions: &[Transaction]) -> TransactionPatternsReport {
        let baskets = baskets_from_transactions(transactions);
        let associations = self.association.mine(&baskets);
        tracing::debug!(
            transactions = transactions.len(),
            baskets = baskets.len(),
            rules = associations.len(),
            "Computed transaction patterns"
        );
        TransactionPatternsReport {
            stats: transaction_stats(transactions),
            heatmap: temporal_heatmap(transactions),
            associations,
        }
    }

    pub fn anomalies(&self, transactions: &[Transaction]) -> AnomalyReport {
        let report = self.anomaly.detect(transactions);
        tracing::debug!(
            transactions = transactions.len(),
            anomalies = report.anomaly_count,
            std_dev = report.std_dev,
            "Scored transactions"
        );
        report
    }

    pub fn product_performance(&self, rows: &[ProductSalesRow], metrics: &[PerformanceMetric]) -> ProductPerformance {
        tracing::debug!(rows = rows.len(), metrics = metrics.len(), "Computing product performance");
        product_performance(rows, metrics)
    }

    pub fn churn(&self, activity: &[CustomerActivity], reference: NaiveDate) -> ChurnAnalysis {
        tracing::debug!(customers = activity.len(), %reference, "Scoring churn risk");
        self.churn.score(activity, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::tests::{date, txn};

    #[test]
    fn rejects_invalid_settings() {
        let bad = AnalyticsSettings { anomaly_z_threshold: -1.0, ..Default::default() };
        assert_eq!(
            AnalyticsEngine::new(&bad).unwrap_err(),
            AnalyticsError::InvalidSetting("anomaly_z_threshold", "must be a positive number, got -1".to_string())
        );
        assert!(AnalyticsEngine::new(&AnalyticsSettings::default()).is_ok());
    }

    #[test]
    fn purchase_frequency_for_two_customers() {
        let txns = vec![
            txn("1", "C1", 50.0, "2024-01-01"),
            txn("2", "C1", 150.0, "2024-02-01"),
            txn("3", "C2", 50.0, "2024-01-15"),
        ];
        let report = AnalyticsEngine::default().purchase_frequency(&txns, date("2024-02-29"));

        let buckets: Vec<_> = report
            .frequency_distribution
            .buckets
            .iter()
            .map(|b| (b.frequency, b.count))
            .collect();
        assert_eq!(buckets, vec![(1, 1), (2, 1)]);
        assert_eq!(report.frequency_distribution.mean, 1.5);
        assert_eq!(report.value_segments.total_customers, 2);
        assert_eq!(report.rfm.customers.len(), 2);
    }

    #[test]
    fn transaction_patterns_on_empty_window() {
        let report = AnalyticsEngine::default().transaction_patterns(&[]);
        assert_eq!(report.stats.total_transactions, 0);
        assert_eq!(report.heatmap.len(), 168);
        assert!(report.associations.is_empty());
    }
}
