//! RFM (recency, frequency, monetary) quadrant segmentation.
//!
//! Thresholds are sample quantiles rather than means so that skewed
//! distributions still spread customers across the segments.

use crate::customers::CustomerAggregate;
use crate::stats;
use serde::Serialize;

/// Days over which the primary recency decay runs (10 -> 5).
const PRIMARY_WINDOW_DAYS: f64 = 730.0;
/// Days over which the secondary decay runs after the primary window (5 -> 0).
const SECONDARY_WINDOW_DAYS: f64 = 1095.0;

const FREQUENCY_QUANTILE: f64 = 0.5;
const RECENCY_QUANTILE: f64 = 0.25;
const MONETARY_QUANTILE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RfmSegment {
    Champions,
    Loyal,
    BigSpenders,
    AtRisk,
    Others,
}

impl RfmSegment {
    pub const ALL: [RfmSegment; 5] = [
        RfmSegment::Champions,
        RfmSegment::Loyal,
        RfmSegment::BigSpenders,
        RfmSegment::AtRisk,
        RfmSegment::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RfmSegment::Champions => "champions",
            RfmSegment::Loyal => "loyal",
            RfmSegment::BigSpenders => "big_spenders",
            RfmSegment::AtRisk => "at_risk",
            RfmSegment::Others => "others",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RfmThresholds {
    pub frequency: f64,
    pub recency: f64,
    pub monetary: f64,
}

/// A customer's position on the RFM axes and the segment it falls in.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmPoint {
    pub customer_id: String,
    pub frequency: u32,
    pub recency_score: f64,
    pub monetary: f64,
    pub segment: RfmSegment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RfmSegmentSummary {
    pub segment: RfmSegment,
    pub count: usize,
    pub percentage: f64,
    pub avg_frequency: f64,
    pub avg_recency_score: f64,
    pub avg_monetary: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RfmAnalysis {
    pub thresholds: RfmThresholds,
    /// One entry per segment, in [`RfmSegment::ALL`] order.
    pub summaries: Vec<RfmSegmentSummary>,
    /// Ordered by customer id.
    pub customers: Vec<RfmPoint>,
}

/// Compresses days since the last purchase into a 0-10 score.
///
/// Within two years the score falls quadratically from 10 to 5, so recent
/// activity is strongly separated. Between two and five years it falls
/// linearly from 5 to 0. Older activity scores 0.
pub fn recency_score(days_since_last: i64) -> f64 {
    let days = days_since_last.max(0) as f64;
    if days <= PRIMARY_WINDOW_DAYS {
        let remaining = 1.0 - days / PRIMARY_WINDOW_DAYS;
        5.0 + 5.0 * remaining * remaining
    } else if days <= PRIMARY_WINDOW_DAYS + SECONDARY_WINDOW_DAYS {
        5.0 * (1.0 - (days - PRIMARY_WINDOW_DAYS) / SECONDARY_WINDOW_DAYS)
    } else {
        0.0
    }
}

/// Rules are evaluated top to bottom; the first match wins.
fn classify(frequency: f64, recency: f64, monetary: f64, t: &RfmThresholds) -> RfmSegment {
    let frequent = frequency >= t.frequency;
    let recent = recency >= t.recency;
    let big = monetary >= t.monetary;

    if frequent && recent && big {
        RfmSegment::Champions
    } else if frequent && recent {
        RfmSegment::Loyal
    } else if big {
        RfmSegment::BigSpenders
    } else if !recent {
        RfmSegment::AtRisk
    } else {
        RfmSegment::Others
    }
}

pub fn rfm_segments(customers: &[CustomerAggregate]) -> RfmAnalysis {
    let frequencies: Vec<f64> = customers.iter().map(|c| c.frequency as f64).collect();
    let recencies: Vec<f64> = customers.iter().map(|c| recency_score(c.recency_days)).collect();
    let monetaries: Vec<f64> = customers.iter().map(|c| c.monetary).collect();

    let thresholds = RfmThresholds {
        frequency: stats::quantile(&frequencies, FREQUENCY_QUANTILE),
        recency: stats::quantile(&recencies, RECENCY_QUANTILE),
        monetary: stats::quantile(&monetaries, MONETARY_QUANTILE),
    };

    let points: Vec<RfmPoint> = customers
        .iter()
        .zip(&recencies)
        .map(|(c, &recency)| RfmPoint {
            customer_id: c.customer_id.clone(),
            frequency: c.frequency,
            recency_score: recency,
            monetary: c.monetary,
            segment: classify(c.frequency as f64, recency, c.monetary, &thresholds),
        })
        .collect();

    let total = points.len();
    let summaries = RfmSegment::ALL
        .into_iter()
        .map(|segment| {
            let members: Vec<&RfmPoint> = points.iter().filter(|p| p.segment == segment).collect();
            let divisor = members.len().max(1) as f64;
            RfmSegmentSummary {
                segment,
                count: members.len(),
                percentage: stats::percentage(members.len() as f64, total as f64),
                avg_frequency: members.iter().map(|p| p.frequency as f64).sum::<f64>() / divisor,
                avg_recency_score: members.iter().map(|p| p.recency_score).sum::<f64>() / divisor,
                avg_monetary: members.iter().map(|p| p.monetary).sum::<f64>() / divisor,
            }
        })
        .collect();

    RfmAnalysis { thresholds, summaries, customers: points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::aggregate_customers;
    use crate::customers::tests::{date, txn};

    #[test]
    fn recency_score_decays_in_two_stages() {
        assert_eq!(recency_score(0), 10.0);
        assert_eq!(recency_score(-3), 10.0);
        assert_eq!(recency_score(730), 5.0);
        assert!((recency_score(365) - 6.25).abs() < 1e-12);
        assert!((recency_score(730 + 547) - 5.0 * (1.0 - 547.0 / 1095.0)).abs() < 1e-12);
        assert_eq!(recency_score(1825), 0.0);
        assert_eq!(recency_score(4000), 0.0);
        assert!(recency_score(10) > recency_score(100));
    }

    #[test]
    fn identical_customers_are_all_champions() {
        let txns: Vec<_> = (0..6)
            .flat_map(|i| {
                let c = format!("C{i}");
                vec![
                    txn(&format!("{i}a"), &c, 40.0, "2024-01-05"),
                    txn(&format!("{i}b"), &c, 60.0, "2024-01-20"),
                ]
            })
            .collect();
        let rfm = rfm_segments(&aggregate_customers(&txns, date("2024-01-31")));

        assert!(rfm.customers.iter().all(|p| p.segment == RfmSegment::Champions));
        let champions = &rfm.summaries[0];
        assert_eq!(champions.count, 6);
        assert_eq!(champions.percentage, 100.0);
        assert!(rfm.summaries[1..].iter().all(|s| s.count == 0 && s.avg_monetary == 0.0));
    }

    #[test]
    fn every_customer_gets_exactly_one_segment() {
        let reference = "2024-12-31";
        let txns = vec![
            // frequent, recent, big
            txn("1", "CHAMP", 500.0, "2024-12-20"),
            txn("2", "CHAMP", 500.0, "2024-12-28"),
            txn("3", "CHAMP", 500.0, "2024-12-30"),
            // frequent, recent, small
            txn("4", "LOYAL", 20.0, "2024-12-01"),
            txn("5", "LOYAL", 20.0, "2024-12-15"),
            txn("6", "LOYAL", 20.0, "2024-12-29"),
            txn("7", "LOYAL2", 25.0, "2024-11-20"),
            txn("8", "LOYAL2", 25.0, "2024-12-10"),
            txn("9", "LOYAL2", 25.0, "2024-12-27"),
            // infrequent, stale, but big
            txn("10", "WHALE", 900.0, "2024-06-01"),
            // infrequent, small, long gone
            txn("11", "GONE", 15.0, "2021-01-01"),
            // infrequent, small, recent
            txn("12", "OTHER", 25.0, "2024-12-25"),
        ];
        let rfm = rfm_segments(&aggregate_customers(&txns, date(reference)));

        let segment_of = |id: &str| rfm.customers.iter().find(|p| p.customer_id == id).unwrap().segment;
        assert_eq!(segment_of("CHAMP"), RfmSegment::Champions);
        assert_eq!(segment_of("LOYAL"), RfmSegment::Loyal);
        assert_eq!(segment_of("WHALE"), RfmSegment::BigSpenders);
        assert_eq!(segment_of("GONE"), RfmSegment::AtRisk);
        assert_eq!(segment_of("OTHER"), RfmSegment::Others);
        // median of 1,1,1,3,3,3
        assert_eq!(rfm.thresholds.frequency, 2.0);

        let total: usize = rfm.summaries.iter().map(|s| s.count).sum();
        assert_eq!(total, rfm.customers.len());
        assert!(rfm.summaries.iter().all(|s| s.count > 0));
    }

    #[test]
    fn empty_input_has_five_empty_segments() {
        let rfm = rfm_segments(&[]);
        assert_eq!(rfm.summaries.len(), 5);
        assert!(rfm.customers.is_empty());
        assert_eq!(rfm.thresholds.frequency, 0.0);
    }
}
