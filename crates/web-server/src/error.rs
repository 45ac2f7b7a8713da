use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use stats_cache::StatsCacheError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Statistics cache error: {0}")]
    StatsCache(#[from] StatsCacheError),
    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] core_types::CoreError),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::StatsCache(StatsCacheError::PeriodNotEnabled(period)) => (
                StatusCode::BAD_REQUEST,
                format!("Period {period} is not enabled"),
            ),
            AppError::StatsCache(StatsCacheError::Store(db_err)) => {
                tracing::error!(error = ?db_err, "Store error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::InvalidPeriod(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
