use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
}

impl From<core_types::CoreError> for AppError {
    fn from(e: core_types::CoreError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Validation failures are the caller's to fix and carry the reason. Anything
/// else is logged in full and answered with a generic message plus the
/// underlying error as `detail`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (kind, message, detail) = match &self {
            AppError::Validation(message) => {
                tracing::debug!(%message, "Rejected request.");
                let body = json!({ "status": "error", "error": "ValidationError", "message": message });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                ("DataAccessError", "An internal database error occurred", db_err.to_string())
            }
            AppError::Analytics(analytics_err) => {
                tracing::error!(error = ?analytics_err, "Analytics error.");
                ("AnalyticsError", "An error occurred during analysis", analytics_err.to_string())
            }
            AppError::Config(config_err) => {
                tracing::error!(error = ?config_err, "Configuration error.");
                ("ConfigError", "A server configuration error occurred", config_err.to_string())
            }
        };

        let body = json!({ "status": "error", "error": kind, "message": message, "detail": detail });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
