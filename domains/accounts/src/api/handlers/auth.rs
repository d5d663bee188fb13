//! Authentication API handlers
//!
//! Signup, login, refresh-token rotation with reuse detection, logout, and
//! the current-user endpoint.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use lumagen_auth::{
    hash_password, issue_access_token, mint_refresh_token, verify_password, AuthError, CurrentUser,
};
use lumagen_common::{Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::api::middleware::AccountsState;

/// Request for creating an account
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Response for signup and the current-user endpoint
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
}

/// Request for logging in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair issued on login and refresh
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Request carrying a refresh token (refresh and logout)
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/signup — create an account
pub async fn signup(
    State(state): State<AccountsState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let password_hash =
        hash_password(&req.password).map_err(|_| Error::Internal("Signup failed".to_string()))?;

    let user = state
        .repos
        .users
        .create(&req.email, &req.username, &password_hash)
        .await?;

    tracing::info!(user_id = user.id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            email: user.email,
            username: user.username,
        }),
    ))
}

/// POST /api/auth/login — verify credentials and issue a token pair.
///
/// An unknown email and a wrong password produce the same response, so the
/// endpoint cannot be used to enumerate accounts.
pub async fn login(
    State(state): State<AccountsState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let invalid = || Error::Authentication("Invalid email or password".to_string());

    let user = state
        .repos
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid());
    }

    let config = state.auth.config();
    let access_token =
        issue_access_token(user.id, config).map_err(|_| Error::Internal("Login failed".to_string()))?;
    let refresh_token =
        mint_refresh_token().map_err(|_| Error::Internal("Login failed".to_string()))?;
    let expires_at = Utc::now() + Duration::days(config.refresh_token_expire_days);

    state
        .repos
        .refresh_tokens
        .create(&refresh_token, user.id, expires_at)
        .await?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
    }))
}

/// POST /api/auth/refresh — rotate the presented refresh token.
///
/// - Unknown token: the token was already rotated away, which means it is
///   being replayed. Answer with the reuse sentinel so clients force a
///   re-login.
/// - Expired token: delete it and answer unauthorized.
/// - Valid token: atomically replace it and issue a fresh access token.
pub async fn refresh(
    State(state): State<AccountsState>,
    Json(req): Json<RefreshRequest>,
) -> std::result::Result<Json<TokenResponse>, AuthError> {
    let stored = state
        .repos
        .refresh_tokens
        .find(&req.refresh_token)
        .await?
        .ok_or(AuthError::RefreshTokenReused)?;

    if stored.is_expired(Utc::now()) {
        state.repos.refresh_tokens.delete(&stored.token).await?;
        return Err(AuthError::RefreshTokenExpired);
    }

    let config = state.auth.config();
    let access_token = issue_access_token(stored.user_id, config)?;
    let new_refresh_token = mint_refresh_token()?;
    let expires_at = Utc::now() + Duration::days(config.refresh_token_expire_days);

    state
        .repos
        .refresh_tokens
        .rotate(&stored.token, &new_refresh_token, stored.user_id, expires_at)
        .await?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: new_refresh_token,
        token_type: "bearer",
    }))
}

/// POST /api/auth/logout — delete the presented refresh token.
/// Unknown tokens are a no-op, so logout is idempotent.
pub async fn logout(
    State(state): State<AccountsState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>> {
    state.repos.refresh_tokens.delete(&req.refresh_token).await?;
    Ok(Json(json!({})))
}

/// GET /api/auth/me — current user profile
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        email: user.email,
        username: user.username,
    })
}
