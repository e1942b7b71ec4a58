//! # Enterprise IQ Database Crate
//!
//! Read-only access to the SQLite sales database: the fact table
//! `dbo_F_Sales_Transaction` and the item and customer dimension tables.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** all SQL lives here. Callers get `core-types` structs back and
//!   never see a row or a column name.
//! - **Bound parameters only:** dates, thresholds and `IN (...)` lists are
//!   always bound; SQL text is built only from fixed fragments.
//! - **Bounded and timed:** a fixed-size `SqlitePool` with an acquire timeout,
//!   and a timeout around every query.
//!
//! ## Public API
//!
//! - `connect`: opens the read-only pool from the `[database]` settings.
//! - `DbRepository`: the query methods used by the web layer and CLI.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;
pub mod repository;

pub use connection::{connect, connect_options};
pub use error::DbError;
pub use repository::DbRepository;
