//! # Enterprise IQ Analytics
//!
//! Pure aggregation over sales row sets: frequency histograms, value and RFM
//! segmentation, z-score anomaly detection, basket association, temporal
//! heatmaps, product performance and churn-risk scoring.
//!
//! ## Architectural Principles
//!
//! - **No I/O:** the crate depends only on `core-types`. Rows arrive already
//!   fetched; results are plain structs that the web layer projects into its
//!   JSON contract. Product-performance results and the segment and risk
//!   labels serialize directly.
//! - **Empty input is not an error:** every aggregation degrades to zeroed or
//!   empty output instead of failing or producing `NaN`.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the configured entry point used by the web layer and CLI.
//! - One module per analysis, each usable on its own.
//! - `AnalyticsError`: returned only when constructing a component with
//!   out-of-range settings.

pub mod anomaly;
pub mod association;
pub mod churn;
pub mod customers;
pub mod engine;
pub mod error;
pub mod frequency;
pub mod product;
pub mod rfm;
pub mod segmentation;
pub mod stats;
pub mod temporal;

pub use anomaly::{AnomalyDetector, AnomalyRecord, AnomalyReport, Breakdown};
pub use association::{AssociationMiner, AssociationRule};
pub use churn::{ChurnAnalysis, ChurnRisk, ChurnScorer, RiskLevel};
pub use customers::{CustomerAggregate, aggregate_customers};
pub use engine::{AnalyticsEngine, AnalyticsSettings, PurchaseFrequencyReport, TransactionPatternsReport};
pub use error::AnalyticsError;
pub use product::ProductPerformance;
pub use rfm::{RfmAnalysis, RfmSegment};
pub use segmentation::{SegmentBucket, ValueSegmentation};
