use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section may be omitted from `config.toml`; missing sections and
/// fields fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub database: Database,
    pub analytics: Analytics,
    pub logging: Logging,
}

/// Contains parameters for the HTTP listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in bytes.
    pub body_limit_bytes: usize,
}

/// Contains parameters for the read-only SQLite connection pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Upper bound on concurrently open connections. Requests beyond this
    /// queue for a connection until `acquire_timeout_secs` elapses.
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Deadline for a single query, measured from the moment it is issued.
    pub query_timeout_secs: u64,
}

/// Thresholds for the statistical aggregations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Analytics {
    /// A transaction is anomalous when its z-score exceeds this value.
    pub anomaly_z_threshold: f64,
    /// Minimum fraction of baskets a product pair must appear in.
    pub association_min_support: f64,
    pub association_min_lift: f64,
    pub association_max_rules: usize,
    /// Days of inactivity after which the recency part of churn risk saturates.
    pub churn_horizon_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

// --- Default Implementations ---

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self {
            path: PathBuf::from("customers.db"),
            max_connections: 8,
            acquire_timeout_secs: 5,
            query_timeout_secs: 15,
        }
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self {
            anomaly_z_threshold: 2.0,
            association_min_support: 0.01,
            association_min_lift: 1.0,
            association_max_rules: 50,
            churn_horizon_days: 365,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "enterprise-iq.log".to_string(),
        }
    }
}

impl Database {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Config {
    /// Rejects settings that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.query_timeout_secs == 0 || self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "database timeouts must be greater than zero".to_string(),
            ));
        }

        let a = &self.analytics;
        let thresholds = [
            ("analytics.anomaly_z_threshold", a.anomaly_z_threshold),
            ("analytics.association_min_support", a.association_min_support),
            ("analytics.association_min_lift", a.association_min_lift),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if a.association_min_support > 1.0 {
            return Err(ConfigError::ValidationError(
                "analytics.association_min_support is a fraction and cannot exceed 1".to_string(),
            ));
        }
        if a.association_max_rules == 0 || a.churn_horizon_days == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.association_max_rules and analytics.churn_horizon_days must be at least 1"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
