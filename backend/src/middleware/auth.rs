//! Authentication middleware
//!
//! Verifies auth-provider access tokens and attaches the caller's profile

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UserRole;
use crate::AppState;

/// Authenticated user information extracted from JWT and the users table
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    /// Raw bearer token, forwarded to the provider for logout and password change
    pub access_token: String,
}

impl AuthUser {
    /// Only admins may manage other users
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.can_manage_users() {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Admins and managers may delete stock records and see cost reports
    pub fn require_manager(&self) -> AppResult<()> {
        if self.role.can_manage_stock() {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }
}

/// Claims carried by provider-issued access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Profile columns needed for authorization
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    email: String,
    role: String,
    is_active: bool,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response()
        }
    };

    let auth_user = match authenticate(&state, token).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(state: &AppState, token: String) -> AppResult<AuthUser> {
    let claims = decode_access_token(
        &token,
        &state.config.auth.jwt_secret,
        &state.config.auth.jwt_audience,
    )?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

    let profile = sqlx::query_as::<_, ProfileRow>("SELECT email, role, is_active FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;

    match profile {
        Some(profile) if !profile.is_active => {
            Err(AppError::Unauthorized("Account is disabled".to_string()))
        }
        Some(profile) => Ok(AuthUser {
            user_id,
            email: profile.email,
            role: profile.role.parse().unwrap_or_default(),
            access_token: token,
        }),
        None => {
            // Signed up with the provider but no profile row yet
            tracing::debug!(%user_id, "no profile row, treating caller as staff");
            Ok(AuthUser {
                user_id,
                email: claims.email.unwrap_or_default(),
                role: UserRole::Staff,
                access_token: token,
            })
        }
    }
}

/// Decode and validate an HS256 access token
pub fn decode_access_token(token: &str, secret: &str, audience: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "super-secret-jwt-token";

    fn token(aud: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: Some("chef@annu.co".to_string()),
            aud: aud.to_string(),
            exp: now + exp_offset,
            iat: Some(now),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "chef@annu.co".to_string(),
            role,
            access_token: String::new(),
        }
    }

    #[test]
    fn test_decode_valid_token() {
        let claims = decode_access_token(&token("authenticated", 3600), SECRET, "authenticated").unwrap();
        assert_eq!(claims.email.as_deref(), Some("chef@annu.co"));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let err = decode_access_token(&token("anon", 3600), SECRET, "authenticated").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let err = decode_access_token(&token("authenticated", 3600), "other", "authenticated").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_expired_token() {
        let err = decode_access_token(&token("authenticated", -3600), SECRET, "authenticated").unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_role_guards() {
        assert!(user(UserRole::Admin).require_admin().is_ok());
        assert!(user(UserRole::Manager).require_admin().is_err());
        assert!(user(UserRole::Manager).require_manager().is_ok());
        assert!(user(UserRole::Staff).require_manager().is_err());
    }
}
