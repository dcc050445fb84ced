//! Recipe handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Recipe;
use crate::services::recipes::{CreateRecipeInput, RecipeService};
use crate::AppState;

pub async fn list_recipes(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Recipe>>> {
    let recipes = RecipeService::new(state.db).list().await?;
    Ok(Json(recipes))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<Recipe>> {
    let recipe = RecipeService::new(state.db).get(recipe_id).await?;
    Ok(Json(recipe))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    current_user.0.require_manager()?;
    let recipe = RecipeService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_manager()?;
    RecipeService::new(state.db).delete(recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
