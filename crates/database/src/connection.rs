use crate::error::DbError;
use configuration::Database;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Connection options for the sales database: read-only, never created on
/// demand, and with `query_only` set so no statement can write.
pub fn connect_options(settings: &Database) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(&settings.path)
        .read_only(true)
        .create_if_missing(false)
        .pragma("query_only", "ON")
}

/// Opens a bounded pool over the sales database.
///
/// Requests beyond `max_connections` queue for up to the acquire timeout and
/// then fail with [`DbError::PoolTimeout`].
pub async fn connect(settings: &Database) -> Result<SqlitePool, DbError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout())
        .connect_with(connect_options(settings))
        .await
        .map_err(|source| DbError::ConnectionError {
            path: settings.path.display().to_string(),
            source,
        })?;

    tracing::info!(
        path = %settings.path.display(),
        max_connections = settings.max_connections,
        "Opened read-only database pool"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_database_file_is_a_connection_error() {
        let settings = Database {
            path: "/nonexistent/dir/customers.db".into(),
            ..Database::default()
        };
        let err = connect(&settings).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionError { .. }));
        assert!(err.to_string().contains("/nonexistent/dir/customers.db"));
    }
}
