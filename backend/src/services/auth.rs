//! Authentication service
//!
//! Sign-in, sign-up and password flows are delegated to the hosted auth
//! provider. This service pairs provider sessions with ERP profiles.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::auth_provider::{ProviderUser, SignUpResponse};
use crate::external::AuthProviderClient;
use crate::models::{UserProfile, UserRole};
use crate::services::UserService;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    provider: AuthProviderClient,
    users: UserService,
}

/// Input for password sign-in
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Input for self-service registration
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub password: String,
}

/// Session handed back to the client after sign-in
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Registration result; `session` is absent while e-mail confirmation is pending
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub session: Option<LoginResponse>,
    pub email_confirmation_required: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(provider: AuthProviderClient, users: UserService) -> Self {
        Self { provider, users }
    }

    /// Authenticate user with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        input.validate()?;

        let session = self.provider.sign_in(&input.email, &input.password).await?;
        let user = self.profile_or_fallback(&session.user).await?;

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        tracing::info!(user_id = %user.id, "user signed in");

        Ok(LoginResponse {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            user,
        })
    }

    /// Register a provider account and create the staff profile
    pub async fn register(&self, input: RegisterInput) -> AppResult<RegisterResponse> {
        input.validate()?;
        shared::validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;

        let signup = self
            .provider
            .sign_up(&input.email, &input.password, &input.name)
            .await?;
        let account = signup.user();

        // The provider account already exists at this point, so a failed
        // profile insert must not fail the registration
        let user = match self
            .users
            .insert_profile(account.id, &input.email, &input.name, UserRole::Staff)
            .await
        {
            Ok(profile) => profile,
            Err(err) => {
                tracing::error!(user_id = %account.id, error = %err, "failed to create user profile");
                fallback_profile(account, Some(&input.name))
            }
        };

        let session = match &signup {
            SignUpResponse::Session(session) => Some(LoginResponse {
                access_token: session.access_token.clone(),
                refresh_token: session.refresh_token.clone(),
                token_type: session.token_type.clone(),
                expires_in: session.expires_in,
                user: user.clone(),
            }),
            SignUpResponse::User(_) => None,
        };

        tracing::info!(user_id = %user.id, "user registered");

        Ok(RegisterResponse {
            email_confirmation_required: session.is_none(),
            user,
            session,
        })
    }

    /// Current user's profile
    pub async fn me(&self, user_id: uuid::Uuid) -> AppResult<UserProfile> {
        self.users.get(user_id).await
    }

    /// Revoke the caller's session
    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        self.provider.sign_out(access_token).await
    }

    /// Send a password-reset e-mail
    pub async fn request_password_reset(&self, input: PasswordResetInput) -> AppResult<()> {
        input.validate()?;
        self.provider.send_password_reset(&input.email).await
    }

    /// Change the caller's password
    pub async fn change_password(&self, access_token: &str, input: ChangePasswordInput) -> AppResult<()> {
        shared::validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;
        self.provider.update_password(access_token, &input.password).await
    }

    async fn profile_or_fallback(&self, account: &ProviderUser) -> AppResult<UserProfile> {
        match self.users.find(account.id).await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::warn!(user_id = %account.id, "no profile row for provider user");
                Ok(fallback_profile(account, None))
            }
        }
    }
}

/// Profile built from the provider account when the users table has none
fn fallback_profile(account: &ProviderUser, name: Option<&str>) -> UserProfile {
    let email = account.email.clone().unwrap_or_default();
    let name = name
        .map(str::to_string)
        .or_else(|| account.metadata_name())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let now = Utc::now();

    UserProfile {
        id: account.id,
        email,
        name,
        role: UserRole::Staff,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
