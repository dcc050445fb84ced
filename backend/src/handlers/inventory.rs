//! HTTP handlers for inventory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::InventoryItem;
use crate::services::inventory::{CreateInventoryInput, InventoryService, ReorderLine, UpdateInventoryInput};
use crate::AppState;

pub async fn list_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let items = InventoryService::new(state.db).list().await?;
    Ok(Json(items))
}

pub async fn get_inventory_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let item = InventoryService::new(state.db).get(item_id).await?;
    Ok(Json(item))
}

/// Items at or below their reorder point
pub async fn get_reorder_list(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<ReorderLine>>> {
    let lines = InventoryService::new(state.db).reorder_list().await?;
    Ok(Json(lines))
}

pub async fn create_inventory_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInventoryInput>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    current_user.0.require_manager()?;
    let item = InventoryService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Update an item; a cost change is logged as a price change
pub async fn update_inventory_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateInventoryInput>,
) -> AppResult<Json<InventoryItem>> {
    current_user.0.require_manager()?;
    let item = InventoryService::new(state.db)
        .update(item_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(item))
}

pub async fn delete_inventory_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_manager()?;
    InventoryService::new(state.db).delete(item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
