//! Controller count and waste handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::handlers::reporting::ReportQuery;
use crate::middleware::CurrentUser;
use crate::models::{CountRecord, WasteRecord};
use crate::services::stock_records::{RecordCountInput, RecordWasteInput, StockRecordService};
use crate::AppState;

pub async fn list_counts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<CountRecord>>> {
    let counts = StockRecordService::new(state.db)
        .list_counts(&query.filter()?)
        .await?;
    Ok(Json(counts))
}

/// Record a count; on-hand stock is set to the counted quantity
pub async fn record_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordCountInput>,
) -> AppResult<(StatusCode, Json<CountRecord>)> {
    let record = StockRecordService::new(state.db)
        .record_count(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_waste(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<WasteRecord>>> {
    let waste = StockRecordService::new(state.db)
        .list_waste(&query.filter()?)
        .await?;
    Ok(Json(waste))
}

pub async fn record_waste(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordWasteInput>,
) -> AppResult<(StatusCode, Json<WasteRecord>)> {
    let record = StockRecordService::new(state.db)
        .record_waste(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
