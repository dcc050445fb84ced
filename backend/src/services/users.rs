//! User profile service
//!
//! Profiles live in the `users` table keyed by the auth provider's user id.
//! Deleting a user only deactivates the profile.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::AuthProviderClient;
use crate::models::{UserProfile, UserRole};

/// User management service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
    provider: AuthProviderClient,
}

/// Row as stored; role is TEXT
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        let role = row.role.parse().unwrap_or_else(|e| {
            tracing::warn!(user_id = %row.id, "{}, defaulting to staff", e);
            UserRole::Staff
        });
        UserProfile {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a user (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Input for updating a user (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

const USER_COLUMNS: &str = "id, email, name, role, is_active, created_at, updated_at";

impl UserService {
    pub fn new(db: PgPool, provider: AuthProviderClient) -> Self {
        Self { db, provider }
    }

    /// List all users, active first
    pub async fn list(&self) -> AppResult<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY is_active DESC, name",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    /// Get a user profile
    pub async fn get(&self, user_id: Uuid) -> AppResult<UserProfile> {
        self.find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub(crate) async fn find(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(UserProfile::from))
    }

    /// Create a confirmed provider account and its profile
    pub async fn create(&self, input: CreateUserInput) -> AppResult<UserProfile> {
        input.validate()?;
        shared::validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;

        let account = self
            .provider
            .admin_create_user(&input.email, &input.password, &input.name)
            .await?;

        let profile = self
            .insert_profile(account.id, &input.email, &input.name, input.role)
            .await?;

        tracing::info!(user_id = %profile.id, role = %profile.role, "user created");
        Ok(profile)
    }

    /// Insert the profile row for a provider account
    pub(crate) async fn insert_profile(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        role: UserRole,
    ) -> AppResult<UserProfile> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(email)
        .bind(name)
        .bind(role.as_str())
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Update name, role or active flag
    pub async fn update(&self, user_id: Uuid, input: UpdateUserInput) -> AppResult<UserProfile> {
        input.validate()?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&input.name)
        .bind(input.role.map(|r| r.as_str()))
        .bind(input.is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into())
    }

    /// Soft delete: the profile stays, flagged inactive
    pub async fn deactivate(&self, acting_user: Uuid, user_id: Uuid) -> AppResult<()> {
        if acting_user == user_id {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "You cannot deactivate your own account".to_string(),
            });
        }

        let result = sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(%user_id, "user deactivated");
        Ok(())
    }
}
