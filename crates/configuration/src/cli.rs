use crate::settings::Config;
use clap::Args;
use std::path::PathBuf;

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Port for the HTTP server.
    #[arg(long)]
    pub port: Option<u16>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
