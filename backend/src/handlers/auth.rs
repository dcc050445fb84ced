//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::UserProfile;
use crate::services::auth::{
    AuthService, ChangePasswordInput, LoginInput, LoginResponse, PasswordResetInput, RegisterInput,
    RegisterResponse,
};
use crate::services::UserService;
use crate::AppState;

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.auth.clone(),
        UserService::new(state.db.clone(), state.auth.clone()),
    )
}

/// Sign in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let response = auth_service(&state).login(input).await?;
    Ok(Json(response))
}

/// Create an account with the auth provider and a staff profile
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let response = auth_service(&state).register(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Send a password-reset e-mail
pub async fn password_reset(
    State(state): State<AppState>,
    Json(input): Json<PasswordResetInput>,
) -> AppResult<StatusCode> {
    auth_service(&state).request_password_reset(input).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> AppResult<Json<UserProfile>> {
    let profile = auth_service(&state).me(current_user.0.user_id).await?;
    Ok(Json(profile))
}

pub async fn logout(State(state): State<AppState>, current_user: CurrentUser) -> AppResult<StatusCode> {
    auth_service(&state).logout(&current_user.0.access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the signed-in user's password
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<StatusCode> {
    auth_service(&state)
        .change_password(&current_user.0.access_token, input)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
