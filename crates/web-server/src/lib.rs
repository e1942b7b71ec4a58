use analytics::{AnalyticsEngine, AnalyticsSettings};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use configuration::Config;
use database::DbRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod responses;

use error::AppError;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db_repo: DbRepository,
    pub engine: AnalyticsEngine,
}

impl AppState {
    pub fn new(db_repo: DbRepository, engine: AnalyticsEngine) -> Self {
        Self { db_repo, engine }
    }

    /// Validates `config`, opens the database pool and builds the engine.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        config.validate()?;
        let engine = AnalyticsEngine::new(&analytics_settings(&config.analytics))?;
        let pool = database::connect(&config.database).await?;
        let db_repo = DbRepository::new(pool).with_query_timeout(config.database.query_timeout());
        Ok(Self::new(db_repo, engine))
    }
}

pub fn analytics_settings(a: &configuration::Analytics) -> AnalyticsSettings {
    AnalyticsSettings {
        anomaly_z_threshold: a.anomaly_z_threshold,
        association_min_support: a.association_min_support,
        association_min_lift: a.association_min_lift,
        association_max_rules: a.association_max_rules,
        churn_horizon_days: a.churn_horizon_days,
    }
}

/// Builds the application router with its middleware stack.
pub fn router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/transaction-patterns/data", get(handlers::get_transaction_patterns))
        .route("/api/transaction-patterns/anomalies", get(handlers::get_anomalies))
        .route("/api/purchase-frequency/data", post(handlers::post_purchase_frequency))
        .route("/api/sales/product-performance", post(handlers::post_product_performance))
        .route("/api/churn-prediction/data", get(handlers::get_churn))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit_bytes))
}

/// Configures and runs the web server until it is shut down.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config).await?);
    let app = router(state, config.server.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
