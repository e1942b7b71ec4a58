use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
