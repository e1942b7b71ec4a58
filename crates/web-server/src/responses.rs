//! The JSON contract consumed by the dashboard charts.
//!
//! Field names here are part of the public API and must stay stable. Every
//! struct is a plain projection of an analytics result; no statistics are
//! computed in this module.

use analytics::anomaly::{AnomalyRecord, AnomalyReport, Breakdown};
use analytics::association::AssociationRule;
use analytics::churn::{ChurnAnalysis, ChurnRisk, METHODOLOGY_KIND, METHODOLOGY_NOTE, RiskLevel};
use analytics::engine::{PurchaseFrequencyReport, TransactionPatternsReport};
use analytics::frequency::{FrequencyDistribution, PurchaseRegularity};
use analytics::product::ProductPerformance;
use analytics::rfm::{RfmAnalysis, RfmPoint, RfmSegment, RfmSegmentSummary, RfmThresholds};
use analytics::segmentation::SegmentBucket;
use analytics::temporal::{HeatmapCell, TransactionStats};
use chrono::{NaiveDate, NaiveDateTime};
use core_types::{DateRange, Transaction};
use serde::Serialize;

/// A single chart datum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyValue<V> {
    pub key: String,
    pub value: V,
}

impl From<&Breakdown> for KeyValue<usize> {
    fn from(b: &Breakdown) -> Self {
        KeyValue { key: b.key.clone(), value: b.count }
    }
}

// --- transaction patterns ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub transaction_id: String,
    pub customer_id: String,
    pub timestamp: NaiveDateTime,
    pub amount: f64,
    pub product_category: Option<String>,
    pub payment_method: Option<String>,
    pub location: Option<String>,
}

impl From<&Transaction> for TransactionView {
    fn from(t: &Transaction) -> Self {
        Self {
            transaction_id: t.transaction_id.clone(),
            customer_id: t.customer_id.clone(),
            timestamp: t.timestamp,
            amount: t.amount,
            product_category: t.product_category.clone(),
            payment_method: t.payment_method.clone(),
            location: t.location.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatsView {
    pub total_transactions: usize,
    pub total_value: f64,
    pub average_value: f64,
    pub unique_customers: usize,
    pub peak_hour: Option<u32>,
    pub peak_day: Option<String>,
}

impl From<TransactionStats> for TransactionStatsView {
    fn from(s: TransactionStats) -> Self {
        Self {
            total_transactions: s.total_transactions,
            total_value: s.total_value,
            average_value: s.average_value,
            unique_customers: s.unique_customers,
            peak_hour: s.peak_hour,
            peak_day: s.peak_day,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HeatmapView {
    pub day: String,
    pub hour: u32,
    pub value: usize,
}

impl From<HeatmapCell> for HeatmapView {
    fn from(c: HeatmapCell) -> Self {
        Self { day: c.day, hour: c.hour, value: c.count }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationView {
    pub product_a: String,
    pub product_b: String,
    pub support: f64,
    pub lift: f64,
}

impl From<AssociationRule> for AssociationView {
    fn from(r: AssociationRule) -> Self {
        Self { product_a: r.product_a, product_b: r.product_b, support: r.support, lift: r.lift }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatternsResponse {
    pub transactions: Vec<TransactionView>,
    pub stats: TransactionStatsView,
    pub temporal_heatmap: Vec<HeatmapView>,
    pub product_associations: Vec<AssociationView>,
}

impl TransactionPatternsResponse {
    pub fn new(transactions: &[Transaction], report: TransactionPatternsReport) -> Self {
        Self {
            transactions: transactions.iter().map(TransactionView::from).collect(),
            stats: report.stats.into(),
            temporal_heatmap: report.heatmap.into_iter().map(HeatmapView::from).collect(),
            product_associations: report.associations.into_iter().map(AssociationView::from).collect(),
        }
    }
}

// --- anomalies ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyView {
    pub transaction_id: String,
    pub customer_id: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
}

impl From<&AnomalyRecord> for AnomalyView {
    fn from(r: &AnomalyRecord) -> Self {
        Self {
            transaction_id: r.transaction_id.clone(),
            customer_id: r.customer_id.clone(),
            timestamp: r.timestamp,
            value: r.value,
            z_score: r.z_score,
            is_anomaly: r.is_anomaly,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyStatsView {
    pub total_transactions: usize,
    pub anomaly_count: usize,
    pub anomaly_rate: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
    pub by_hour: Vec<KeyValue<usize>>,
    pub by_weekday: Vec<KeyValue<usize>>,
    pub by_payment_method: Vec<KeyValue<usize>>,
    pub by_value_band: Vec<KeyValue<usize>>,
}

#[derive(Debug, Serialize)]
pub struct AnomaliesResponse {
    /// Flagged records only.
    pub anomalies: Vec<AnomalyView>,
    pub stats: AnomalyStatsView,
}

impl From<AnomalyReport> for AnomaliesResponse {
    fn from(report: AnomalyReport) -> Self {
        let pairs = |items: &[Breakdown]| items.iter().map(KeyValue::<usize>::from).collect::<Vec<_>>();
        Self {
            anomalies: report.anomalies().map(AnomalyView::from).collect(),
            stats: AnomalyStatsView {
                total_transactions: report.records.len(),
                anomaly_count: report.anomaly_count,
                anomaly_rate: report.anomaly_rate(),
                mean: report.mean,
                std_dev: report.std_dev,
                threshold: report.threshold,
                by_hour: pairs(&report.by_hour),
                by_weekday: pairs(&report.by_weekday),
                by_payment_method: pairs(&report.by_payment_method),
                by_value_band: pairs(&report.by_value_band),
            },
        }
    }
}

// --- purchase frequency ---

#[derive(Debug, Serialize)]
pub struct FrequencyBucketView {
    pub frequency: u32,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyDistributionView {
    pub buckets: Vec<FrequencyBucketView>,
    pub total_customers: usize,
    pub mean_frequency: f64,
    pub high_frequency_threshold: f64,
    pub low_frequency_threshold: f64,
    pub high_frequency_count: usize,
    pub low_frequency_count: usize,
}

impl From<FrequencyDistribution> for FrequencyDistributionView {
    fn from(d: FrequencyDistribution) -> Self {
        Self {
            buckets: d
                .buckets
                .iter()
                .map(|b| FrequencyBucketView { frequency: b.frequency, count: b.count })
                .collect(),
            total_customers: d.total_customers,
            mean_frequency: d.mean,
            high_frequency_threshold: d.high_threshold,
            low_frequency_threshold: d.low_threshold,
            high_frequency_count: d.high_count,
            low_frequency_count: d.low_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRegularityView {
    pub intervals: Vec<KeyValue<usize>>,
    pub repeat_customers: usize,
    pub mean_interval: f64,
    pub median_interval: f64,
}

impl From<PurchaseRegularity> for PurchaseRegularityView {
    fn from(r: PurchaseRegularity) -> Self {
        Self {
            intervals: r
                .bins
                .into_iter()
                .map(|bin| KeyValue { key: bin.range, value: bin.count })
                .collect(),
            repeat_customers: r.repeat_customers,
            mean_interval: r.mean_interval,
            median_interval: r.median_interval,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentView {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
    pub avg_value: f64,
}

impl From<SegmentBucket> for SegmentView {
    fn from(s: SegmentBucket) -> Self {
        Self { label: s.label, count: s.count, percentage: s.percentage, avg_value: s.avg_value }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RfmSegmentView {
    pub segment: RfmSegment,
    pub count: usize,
    pub percentage: f64,
    pub avg_frequency: f64,
    pub avg_recency_score: f64,
    pub avg_monetary: f64,
}

impl From<RfmSegmentSummary> for RfmSegmentView {
    fn from(s: RfmSegmentSummary) -> Self {
        Self {
            segment: s.segment,
            count: s.count,
            percentage: s.percentage,
            avg_frequency: s.avg_frequency,
            avg_recency_score: s.avg_recency_score,
            avg_monetary: s.avg_monetary,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RfmCustomerView {
    pub customer_id: String,
    pub frequency: u32,
    pub recency_score: f64,
    pub monetary: f64,
    pub segment: RfmSegment,
}

impl From<RfmPoint> for RfmCustomerView {
    fn from(p: RfmPoint) -> Self {
        Self {
            customer_id: p.customer_id,
            frequency: p.frequency,
            recency_score: p.recency_score,
            monetary: p.monetary,
            segment: p.segment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RfmView {
    pub thresholds: RfmThresholds,
    pub segments: Vec<RfmSegmentView>,
    pub customers: Vec<RfmCustomerView>,
}

impl From<RfmAnalysis> for RfmView {
    fn from(rfm: RfmAnalysis) -> Self {
        Self {
            thresholds: rfm.thresholds,
            segments: rfm.summaries.into_iter().map(RfmSegmentView::from).collect(),
            customers: rfm.customers.into_iter().map(RfmCustomerView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseFrequencyResponse {
    pub frequency_distribution: FrequencyDistributionView,
    pub purchase_regularity: PurchaseRegularityView,
    pub customer_segments: Vec<SegmentView>,
    pub rfm_segments: RfmView,
}

impl From<PurchaseFrequencyReport> for PurchaseFrequencyResponse {
    fn from(r: PurchaseFrequencyReport) -> Self {
        Self {
            frequency_distribution: r.frequency_distribution.into(),
            purchase_regularity: r.purchase_regularity.into(),
            customer_segments: r.value_segments.segments.into_iter().map(SegmentView::from).collect(),
            rfm_segments: r.rfm.into(),
        }
    }
}

// --- product performance ---

#[derive(Debug, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Keeps the snake_case envelope the sales tools have always returned.
#[derive(Debug, Serialize)]
pub struct ProductPerformanceResponse {
    pub status: &'static str,
    pub period: Period,
    pub results: ProductPerformance,
}

impl ProductPerformanceResponse {
    pub fn new(range: &DateRange, results: ProductPerformance) -> Self {
        Self { status: "success", period: Period { start: range.start, end: range.end }, results }
    }
}

// --- churn ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnCustomerView {
    pub customer_id: String,
    pub churn_probability: f64,
    pub risk_level: RiskLevel,
    pub days_since_last_purchase: i64,
    pub transaction_count: u32,
    pub avg_transaction_value: f64,
    pub total_spent: f64,
    pub contributing_factors: Vec<String>,
}

impl From<ChurnRisk> for ChurnCustomerView {
    fn from(c: ChurnRisk) -> Self {
        Self {
            customer_id: c.customer_id,
            churn_probability: c.churn_probability,
            risk_level: c.risk_level,
            days_since_last_purchase: c.days_since_last_purchase,
            transaction_count: c.transaction_count,
            avg_transaction_value: c.avg_transaction_value,
            total_spent: c.total_spent,
            contributing_factors: c.contributing_factors,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RiskBucketView {
    pub key: RiskLevel,
    pub value: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnSummaryView {
    pub total_customers: usize,
    pub average_probability: f64,
    pub high_risk_count: usize,
    pub reference_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct Methodology {
    pub kind: &'static str,
    pub note: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnResponse {
    pub customers: Vec<ChurnCustomerView>,
    pub risk_distribution: Vec<RiskBucketView>,
    pub summary: ChurnSummaryView,
    pub methodology: Methodology,
}

impl From<ChurnAnalysis> for ChurnResponse {
    fn from(c: ChurnAnalysis) -> Self {
        Self {
            customers: c.customers.into_iter().map(ChurnCustomerView::from).collect(),
            risk_distribution: c
                .risk_distribution
                .into_iter()
                .map(|b| RiskBucketView { key: b.level, value: b.count, percentage: b.percentage })
                .collect(),
            summary: ChurnSummaryView {
                total_customers: c.summary.total_customers,
                average_probability: c.summary.average_probability,
                high_risk_count: c.summary.high_risk_count,
                reference_date: c.summary.reference_date,
            },
            methodology: Methodology { kind: METHODOLOGY_KIND, note: METHODOLOGY_NOTE },
        }
    }
}
