//! Sales handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::handlers::reporting::ReportQuery;
use crate::middleware::CurrentUser;
use crate::models::Sale;
use crate::services::sales::{CreateSaleInput, SalesService};
use crate::AppState;

/// Sales in the optional date range
pub async fn list_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<Sale>>> {
    let sales = SalesService::new(state.db).list(&query.filter()?).await?;
    Ok(Json(sales))
}

pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<(StatusCode, Json<Sale>)> {
    let sale = SalesService::new(state.db)
        .create(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
