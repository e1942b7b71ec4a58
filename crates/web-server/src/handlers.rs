use crate::responses::{
    AnomaliesResponse, ChurnResponse, ProductPerformanceResponse, PurchaseFrequencyResponse,
    TransactionPatternsResponse,
};
use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use chrono::Local;
use core_types::{CategoryLevel, DateRange, PerformanceMetric};
use serde::Deserialize;
use std::sync::Arc;

/// Metrics analyzed when a request names none.
const DEFAULT_METRICS: [PerformanceMetric; 3] =
    [PerformanceMetric::Sales, PerformanceMetric::Units, PerformanceMetric::Margin];

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseFrequencyRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub customer_segments: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductPerformanceRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub metrics: Option<Vec<String>>,
    pub category_level: Option<String>,
    pub min_sales_threshold: Option<f64>,
}

/// A product-performance request after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub range: DateRange,
    pub metrics: Vec<PerformanceMetric>,
    pub level: CategoryLevel,
    pub min_sales: Option<f64>,
}

impl ProductPerformanceRequest {
    pub fn validate(&self) -> Result<ProductQuery, AppError> {
        let range = DateRange::parse(
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            "start_date",
            "end_date",
        )?;
        let metrics = match &self.metrics {
            None => DEFAULT_METRICS.to_vec(),
            Some(names) if names.is_empty() => {
                return Err(AppError::Validation("metrics must name at least one metric".to_string()));
            }
            Some(names) => names
                .iter()
                .map(|name| name.parse::<PerformanceMetric>())
                .collect::<Result<Vec<_>, _>>()?,
        };
        let level = match self.category_level.as_deref() {
            None => CategoryLevel::default(),
            Some(raw) => raw.parse()?,
        };
        Ok(ProductQuery { range, metrics, level, min_sales: self.min_sales_threshold })
    }
}

// --- Analyses, shared by the HTTP handlers and the CLI ---

pub async fn transaction_patterns(state: &AppState, range: &DateRange) -> Result<TransactionPatternsResponse, AppError> {
    let transactions = state.db_repo.get_transactions(range).await?;
    let report = state.engine.transaction_patterns(&transactions);
    tracing::info!(
        start = %range.start,
        end = %range.end,
        transactions = transactions.len(),
        "Analyzed transaction patterns"
    );
    Ok(TransactionPatternsResponse::new(&transactions, report))
}

pub async fn anomalies(state: &AppState, range: &DateRange) -> Result<AnomaliesResponse, AppError> {
    let transactions = state.db_repo.get_transactions(range).await?;
    let report = state.engine.anomalies(&transactions);
    tracing::info!(
        start = %range.start,
        end = %range.end,
        transactions = transactions.len(),
        anomalies = report.anomaly_count,
        "Analyzed anomalies"
    );
    Ok(report.into())
}

pub async fn purchase_frequency(
    state: &AppState,
    range: &DateRange,
    segments: &[String],
) -> Result<PurchaseFrequencyResponse, AppError> {
    let transactions = state.db_repo.get_customer_transactions(range, segments).await?;
    let report = state.engine.purchase_frequency(&transactions, range.end);
    tracing::info!(
        start = %range.start,
        end = %range.end,
        segments = segments.len(),
        transactions = transactions.len(),
        "Analyzed purchase frequency"
    );
    Ok(report.into())
}

pub async fn product_performance(state: &AppState, query: &ProductQuery) -> Result<ProductPerformanceResponse, AppError> {
    let rows = state
        .db_repo
        .get_product_sales(&query.range, query.level, query.min_sales)
        .await?;
    let results = state.engine.product_performance(&rows, &query.metrics);
    tracing::info!(level = %query.level, rows = rows.len(), "Analyzed product performance");
    Ok(ProductPerformanceResponse::new(&query.range, results))
}

/// Scores churn against the newest transaction in the data set, falling back
/// to today for an empty table.
pub async fn churn(state: &AppState) -> Result<ChurnResponse, AppError> {
    let reference = state
        .db_repo
        .get_latest_transaction_date()
        .await?
        .unwrap_or_else(|| Local::now().date_naive());
    let activity = state.db_repo.get_customer_activity().await?;
    let analysis = state.engine.churn(&activity, reference);
    tracing::info!(%reference, customers = activity.len(), "Scored churn risk");
    Ok(analysis.into())
}

// --- HTTP handlers ---

/// # GET /api/transaction-patterns/data
pub async fn get_transaction_patterns(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<TransactionPatternsResponse>, AppError> {
    let Query(params) = params?;
    let range = DateRange::parse(params.start.as_deref(), params.end.as_deref(), "start", "end")?;
    Ok(Json(transaction_patterns(&state, &range).await?))
}

/// # GET /api/transaction-patterns/anomalies
pub async fn get_anomalies(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<AnomaliesResponse>, AppError> {
    let Query(params) = params?;
    let range = DateRange::parse(params.start.as_deref(), params.end.as_deref(), "start", "end")?;
    Ok(Json(anomalies(&state, &range).await?))
}

/// # POST /api/purchase-frequency/data
pub async fn post_purchase_frequency(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PurchaseFrequencyRequest>, JsonRejection>,
) -> Result<Json<PurchaseFrequencyResponse>, AppError> {
    let Json(request) = payload?;
    let range = DateRange::parse(
        request.start_date.as_deref(),
        request.end_date.as_deref(),
        "start_date",
        "end_date",
    )?;
    let segments = request.customer_segments.unwrap_or_default();
    Ok(Json(purchase_frequency(&state, &range, &segments).await?))
}

/// # POST /api/sales/product-performance
pub async fn post_product_performance(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProductPerformanceRequest>, JsonRejection>,
) -> Result<Json<ProductPerformanceResponse>, AppError> {
    let Json(request) = payload?;
    let query = request.validate()?;
    Ok(Json(product_performance(&state, &query).await?))
}

/// # GET /api/churn-prediction/data
pub async fn get_churn(State(state): State<Arc<AppState>>) -> Result<Json<ChurnResponse>, AppError> {
    Ok(Json(churn(&state).await?))
}
