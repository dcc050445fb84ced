//! Purchase order and receiving handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{PurchaseOrder, Receipt};
use crate::services::purchasing::{
    CreatePurchaseOrderInput, PurchasingService, ReceiveInput, ReceiveResult, UpdatePurchaseOrderInput,
};
use crate::AppState;

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let orders = PurchasingService::new(state.db).list().await?;
    Ok(Json(orders))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let order = PurchasingService::new(state.db).get(order_id).await?;
    Ok(Json(order))
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<(StatusCode, Json<PurchaseOrder>)> {
    current_user.0.require_manager()?;
    let order = PurchasingService::new(state.db)
        .create(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseOrderInput>,
) -> AppResult<Json<PurchaseOrder>> {
    current_user.0.require_manager()?;
    let order = PurchasingService::new(state.db).update(order_id, input).await?;
    Ok(Json(order))
}

pub async fn delete_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_manager()?;
    PurchasingService::new(state.db).delete(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Receive stock against an order. An empty body receives everything outstanding.
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    input: Option<Json<ReceiveInput>>,
) -> AppResult<Json<ReceiveResult>> {
    let input = input.map(|Json(input)| input).unwrap_or_default();
    let result = PurchasingService::new(state.db)
        .receive(order_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(result))
}

pub async fn get_receiving_log(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Receipt>>> {
    let receipts = PurchasingService::new(state.db).receiving_log().await?;
    Ok(Json(receipts))
}
