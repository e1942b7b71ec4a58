use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid analytics setting '{0}': {1}")]
    InvalidSetting(&'static str, String),
}
