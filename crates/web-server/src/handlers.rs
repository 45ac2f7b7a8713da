use crate::{AppState, error::AppError};
use analytics::PeriodStats;
use axum::{
    Json,
    extract::{Path, State},
};
use core_types::Period;
use database::CacheRecord;
use serde::Deserialize;
use stats_cache::CacheStatus;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AccountPath {
    pub user_id: Uuid,
    pub account_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PeriodPath {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub period: String,
}

impl PeriodPath {
    fn period(&self) -> Result<Period, AppError> {
        Ok(self.period.parse()?)
    }
}

/// # GET /api/users/:user_id/accounts/:account_id/stats
/// Statistics for every configured period, in configuration order.
pub async fn get_all_stats(
    Path(path): Path<AccountPath>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PeriodStats>>, AppError> {
    let stats = state.manager.get_all(path.user_id, path.account_id).await?;
    Ok(Json(stats))
}

/// # GET /api/users/:user_id/accounts/:account_id/stats/:period
pub async fn get_period_stats(
    Path(path): Path<PeriodPath>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PeriodStats>, AppError> {
    let period = path.period()?;
    let stats = state
        .manager
        .get(path.user_id, path.account_id, period)
        .await?;
    Ok(Json(stats))
}

/// # GET /api/users/:user_id/accounts/:account_id/stats/:period/status
pub async fn get_cache_status(
    Path(path): Path<PeriodPath>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheStatus>, AppError> {
    let period = path.period()?;
    state
        .manager
        .peek(path.user_id, path.account_id, period)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No cached statistics for period {period}")))
}

/// # POST /api/users/:user_id/accounts/:account_id/stats/invalidate
/// Called after journal data changes; recomputes every configured period.
pub async fn invalidate_stats(
    Path(path): Path<AccountPath>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CacheRecord>>, AppError> {
    let records = state
        .manager
        .invalidate_all(path.user_id, path.account_id)
        .await?;
    Ok(Json(records))
}
