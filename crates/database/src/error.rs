use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to open the database at '{path}': {source}")]
    ConnectionError {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Timed out waiting for a free database connection.")]
    PoolTimeout,

    #[error("Query '{0}' did not complete within {1:?}.")]
    QueryTimeout(&'static str, Duration),

    #[error("Database query failed: {0}")]
    QueryError(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => DbError::PoolTimeout,
            other => DbError::QueryError(other),
        }
    }
}
