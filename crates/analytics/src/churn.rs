//! Deterministic churn-risk scoring.
//!
//! This is a weighted heuristic over recency, frequency and spend relative to
//! the customer base, not a trained classifier. Callers surface that fact
//! through [`METHODOLOGY_NOTE`].

use crate::error::AnalyticsError;
use crate::stats;
use chrono::NaiveDate;
use core_types::CustomerActivity;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_HORIZON_DAYS: u32 = 365;

pub const METHODOLOGY_KIND: &str = "heuristic";
pub const METHODOLOGY_NOTE: &str = "Churn probabilities are a weighted score of recency, purchase frequency \
     and average spend relative to the median customer. They are not the output of a trained model.";

const RECENCY_WEIGHT: f64 = 0.6;
const FREQUENCY_WEIGHT: f64 = 0.25;
const MONETARY_WEIGHT: f64 = 0.15;
/// A component at or above this value is reported as a contributing factor.
const FACTOR_CUTOFF: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::VeryHigh];

    /// Upper bounds are inclusive: 0.3 is still `Low`.
    pub fn from_probability(p: f64) -> Self {
        if p <= 0.3 {
            RiskLevel::Low
        } else if p <= 0.6 {
            RiskLevel::Medium
        } else if p <= 0.8 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChurnRisk {
    pub customer_id: String,
    pub churn_probability: f64,
    pub risk_level: RiskLevel,
    pub days_since_last_purchase: i64,
    pub transaction_count: u32,
    pub avg_transaction_value: f64,
    pub total_spent: f64,
    pub contributing_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskBucket {
    pub level: RiskLevel,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChurnSummary {
    pub total_customers: usize,
    pub average_probability: f64,
    /// Customers rated `High` or `Very High`.
    pub high_risk_count: usize,
    pub reference_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChurnAnalysis {
    /// Highest probability first.
    pub customers: Vec<ChurnRisk>,
    /// All four levels, lowest risk first.
    pub risk_distribution: Vec<RiskBucket>,
    pub summary: ChurnSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct ChurnScorer {
    horizon_days: u32,
}

impl Default for ChurnScorer {
    fn default() -> Self {
        Self { horizon_days: DEFAULT_HORIZON_DAYS }
    }
}

impl ChurnScorer {
    pub fn new(horizon_days: u32) -> Result<Self, AnalyticsError> {
        if horizon_days == 0 {
            return Err(AnalyticsError::InvalidSetting(
                "churn_horizon_days",
                "must be at least 1".to_string(),
            ));
        }
        Ok(Self { horizon_days })
    }

    /// Scores every customer against `reference`, normally the latest
    /// transaction date in the data set.
    pub fn score(&self, activity: &[CustomerActivity], reference: NaiveDate) -> ChurnAnalysis {
        let counts: Vec<f64> = activity.iter().map(|a| a.transaction_count as f64).collect();
        let averages: Vec<f64> = activity.iter().map(|a| a.avg_transaction_value).collect();
        let median_count = positive_or_one(stats::median(&counts));
        let median_avg = positive_or_one(stats::median(&averages));
        let horizon = self.horizon_days as f64;

        let mut customers: Vec<ChurnRisk> = activity
            .iter()
            .map(|a| {
                let days = (reference - a.last_purchase.date()).num_days().max(0);
                let components = [
                    ("days_since_last_purchase", RECENCY_WEIGHT, (days as f64 / horizon).min(1.0)),
                    (
                        "transaction_count",
                        FREQUENCY_WEIGHT,
                        1.0 - (a.transaction_count as f64 / median_count / 2.0).min(1.0),
                    ),
                    (
                        "avg_transaction_value",
                        MONETARY_WEIGHT,
                        1.0 - (a.avg_transaction_value / median_avg / 2.0).min(1.0),
                    ),
                ];
                let probability = components
                    .iter()
                    .map(|(_, weight, value)| weight * value)
                    .sum::<f64>()
                    .clamp(0.0, 1.0);

                ChurnRisk {
                    customer_id: a.customer_id.clone(),
                    churn_probability: probability,
                    risk_level: RiskLevel::from_probability(probability),
                    days_since_last_purchase: days,
                    transaction_count: a.transaction_count,
                    avg_transaction_value: a.avg_transaction_value,
                    total_spent: a.total_spent,
                    // Components are listed heaviest weight first.
                    contributing_factors: components
                        .iter()
                        .filter(|(_, _, value)| *value >= FACTOR_CUTOFF)
                        .map(|(label, _, _)| label.to_string())
                        .collect(),
                }
            })
            .collect();

        customers.sort_by(|a, b| {
            b.churn_probability
                .partial_cmp(&a.churn_probability)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });

        let total = customers.len();
        let risk_distribution = RiskLevel::ALL
            .into_iter()
            .map(|level| {
                let count = customers.iter().filter(|c| c.risk_level == level).count();
                RiskBucket { level, count, percentage: stats::percentage(count as f64, total as f64) }
            })
            .collect();
        let probabilities: Vec<f64> = customers.iter().map(|c| c.churn_probability).collect();

        ChurnAnalysis {
            summary: ChurnSummary {
                total_customers: total,
                average_probability: stats::mean(&probabilities),
                high_risk_count: customers
                    .iter()
                    .filter(|c| matches!(c.risk_level, RiskLevel::High | RiskLevel::VeryHigh))
                    .count(),
                reference_date: reference,
            },
            customers,
            risk_distribution,
        }
    }
}

fn positive_or_one(value: f64) -> f64 {
    if value > 0.0 { value } else { 1.0 }
}
