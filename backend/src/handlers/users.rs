//! User administration handlers (admin only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::UserProfile;
use crate::services::users::{CreateUserInput, UpdateUserInput, UserService};
use crate::AppState;

fn user_service(state: &AppState) -> UserService {
    UserService::new(state.db.clone(), state.auth.clone())
}

pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    current_user.0.require_admin()?;
    let users = user_service(&state).list().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserProfile>> {
    current_user.0.require_admin()?;
    let user = user_service(&state).get(user_id).await?;
    Ok(Json(user))
}

/// Create a provider account and its profile
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    current_user.0.require_admin()?;
    let user = user_service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<Json<UserProfile>> {
    current_user.0.require_admin()?;
    let user = user_service(&state).update(user_id, input).await?;
    Ok(Json(user))
}

/// Soft delete: the profile is deactivated, not removed
pub async fn deactivate_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_admin()?;
    user_service(&state)
        .deactivate(current_user.0.user_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
