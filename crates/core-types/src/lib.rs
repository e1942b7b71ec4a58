//! # Enterprise IQ Core Types
//!
//! The foundational data structures shared by every other crate in the
//! workspace. This crate has no knowledge of the database, the web layer or
//! the statistics built on top of these types.

pub mod enums;
pub mod error;
pub mod range;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CategoryLevel, PerformanceMetric};
pub use error::CoreError;
pub use range::{DateRange, parse_txn_timestamp};
pub use structs::{CustomerActivity, ProductSalesRow, Transaction};
