use crate::error::ConfigError;
use config::{Environment, File, FileFormat};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
#[cfg(feature = "clap")]
pub mod cli;

// Re-export the core types to provide a clean public API.
pub use settings::{Analytics, Config, Database, Logging, Server};

/// Name of the file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads the application configuration.
///
/// Sources are layered in order: built-in defaults, then the TOML file at
/// `path` (or an optional `config.toml` in the working directory), then
/// environment variables such as `EIQ__DATABASE__PATH`. The result is
/// validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        // An explicitly requested file must exist.
        Some(path) => File::from(path).format(FileFormat::Toml).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("EIQ")
                .prefix_separator("__")
                .separator("__"),
        );
    finish(builder)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Config, ConfigError> {
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(database = %config.database.path.display(), "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<Config, ConfigError> {
        finish(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.analytics.anomaly_z_threshold, 2.0);
        assert_eq!(config.analytics.association_min_support, 0.01);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = from_toml(
            r#"
            [database]
            path = "/data/sales_agent.db"
            query_timeout_secs = 3

            [analytics]
            anomaly_z_threshold = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path.to_str(), Some("/data/sales_agent.db"));
        assert_eq!(config.database.query_timeout().as_secs(), 3);
        assert_eq!(config.database.acquire_timeout().as_secs(), 5);
        assert_eq!(config.analytics.anomaly_z_threshold, 3.0);
        assert_eq!(config.analytics.association_max_rules, 50);
    }

    #[test]
    fn rejects_invalid_thresholds() {
        let err = from_toml("[analytics]\nassociation_min_support = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = from_toml("[database]\nmax_connections = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
