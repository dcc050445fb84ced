//! Hosted auth provider client
//!
//! Talks to a GoTrue-compatible REST API (`/auth/v1/...`). Passwords and
//! e-mail confirmation live with the provider; the ERP only keeps profiles.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// Auth provider API client
#[derive(Clone)]
pub struct AuthProviderClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

/// Provider-side account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl ProviderUser {
    /// Display name stored in the provider metadata, if any
    pub fn metadata_name(&self) -> Option<String> {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// Session returned by a successful password sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: ProviderUser,
}

/// Sign-up answers with a session when e-mail confirmation is off and
/// with the bare user when it is on
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(ProviderSession),
    User(ProviderUser),
}

impl SignUpResponse {
    pub fn user(&self) -> &ProviderUser {
        match self {
            SignUpResponse::Session(session) => &session.user,
            SignUpResponse::User(user) => user,
        }
    }

    pub fn session(&self) -> Option<&ProviderSession> {
        match self {
            SignUpResponse::Session(session) => Some(session),
            SignUpResponse::User(_) => None,
        }
    }
}

/// Error body; the provider is not consistent about which key it fills
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

impl AuthProviderClient {
    /// Create a new AuthProviderClient
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.provider_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn public(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    fn admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    /// Password sign-in
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<ProviderSession> {
        let response = self
            .send(self.public(
                self.client
                    .post(self.url("token?grant_type=password"))
                    .json(&json!({ "email": email, "password": password })),
            ))
            .await?;

        if matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            tracing::debug!(email, "auth provider rejected credentials");
            return Err(AppError::InvalidCredentials);
        }

        Self::parse(response).await
    }

    /// Register a new account; the display name travels as user metadata
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> AppResult<SignUpResponse> {
        let response = self
            .send(self.public(self.client.post(self.url("signup")).json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))))
            .await?;

        Self::parse(response).await
    }

    /// Revoke the session behind `access_token`
    pub async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .send(self.public(self.client.post(self.url("logout")).bearer_auth(access_token)))
            .await?;

        Self::expect_success(response).await
    }

    /// Send the password-reset e-mail
    pub async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        let response = self
            .send(self.public(
                self.client
                    .post(self.url("recover"))
                    .json(&json!({ "email": email })),
            ))
            .await?;

        Self::expect_success(response).await
    }

    /// Change the password of the user owning `access_token`
    pub async fn update_password(&self, access_token: &str, password: &str) -> AppResult<()> {
        let response = self
            .send(self.public(
                self.client
                    .put(self.url("user"))
                    .bearer_auth(access_token)
                    .json(&json!({ "password": password })),
            ))
            .await?;

        Self::expect_success(response).await
    }

    /// Create a confirmed account with the service role key
    pub async fn admin_create_user(&self, email: &str, password: &str, name: &str) -> AppResult<ProviderUser> {
        let response = self
            .send(self.admin(self.client.post(self.url("admin/users")).json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": { "name": name },
            }))))
            .await?;

        Self::parse(response).await
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        builder
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("request failed: {}", e)))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> AppResult<T> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::AuthProvider(format!("failed to parse response: {}", e)))
    }

    async fn expect_success(response: Response) -> AppResult<()> {
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(provider_error(status, &body))
    }
}

/// Map a failed provider response onto the API error taxonomy
fn provider_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(ProviderErrorBody::into_message)
        .unwrap_or_else(|| format!("{} - {}", status, body));

    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
            AppError::ValidationError(message)
        }
        StatusCode::CONFLICT => AppError::DuplicateEntry("email".to_string()),
        _ => AppError::AuthProvider(message),
    }
}
