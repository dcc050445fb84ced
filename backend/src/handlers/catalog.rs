//! Category and department handlers
//!
//! Both tables share one service parameterised by [`CatalogKind`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{CatalogEntry, CatalogInput, CatalogKind, CatalogService};
use crate::AppState;

async fn list(state: AppState, kind: CatalogKind) -> AppResult<Json<Vec<CatalogEntry>>> {
    let entries = CatalogService::new(state.db, kind).list().await?;
    Ok(Json(entries))
}

async fn create(
    state: AppState,
    current_user: CurrentUser,
    kind: CatalogKind,
    input: CatalogInput,
) -> AppResult<(StatusCode, Json<CatalogEntry>)> {
    current_user.0.require_manager()?;
    let entry = CatalogService::new(state.db, kind).create(input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update(
    state: AppState,
    current_user: CurrentUser,
    kind: CatalogKind,
    id: Uuid,
    input: CatalogInput,
) -> AppResult<Json<CatalogEntry>> {
    current_user.0.require_manager()?;
    let entry = CatalogService::new(state.db, kind).update(id, input).await?;
    Ok(Json(entry))
}

async fn delete(state: AppState, current_user: CurrentUser, kind: CatalogKind, id: Uuid) -> AppResult<StatusCode> {
    current_user.0.require_manager()?;
    CatalogService::new(state.db, kind).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    list(state, CatalogKind::Category).await
}

pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CatalogInput>,
) -> AppResult<(StatusCode, Json<CatalogEntry>)> {
    create(state, current_user, CatalogKind::Category, input).await
}

pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CatalogInput>,
) -> AppResult<Json<CatalogEntry>> {
    update(state, current_user, CatalogKind::Category, id, input).await
}

pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    delete(state, current_user, CatalogKind::Category, id).await
}

pub async fn list_departments(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    list(state, CatalogKind::Department).await
}

pub async fn create_department(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CatalogInput>,
) -> AppResult<(StatusCode, Json<CatalogEntry>)> {
    create(state, current_user, CatalogKind::Department, input).await
}

pub async fn update_department(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CatalogInput>,
) -> AppResult<Json<CatalogEntry>> {
    update(state, current_user, CatalogKind::Department, id, input).await
}

pub async fn delete_department(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    delete(state, current_user, CatalogKind::Department, id).await
}
