//! Authentication errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Sentinel detail returned when a refresh token is presented a second time.
/// Clients treat this as evidence of theft and prompt a full re-login.
pub const REFRESH_REUSE_DETAIL: &str = "refresh_token_reused";

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    MissingAuthorization,
    InvalidAuthorizationFormat,
    InvalidToken,
    UserNotFound,
    UserLoadError,
    PasswordHashError,
    TokenIssueError,
    /// Presented refresh token matches no stored row (reuse detection)
    RefreshTokenReused,
    /// Presented refresh token exists but is past its expiry
    RefreshTokenExpired,
    /// Underlying store failed while handling credentials
    StoreError,
}

impl From<lumagen_common::Error> for AuthError {
    fn from(e: lumagen_common::Error) -> Self {
        tracing::error!(error = %e, "Store failure during credential handling");
        AuthError::StoreError
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            // The bearer scheme itself is absent or malformed
            AuthError::MissingAuthorization => (
                StatusCode::FORBIDDEN,
                "MISSING_AUTHORIZATION",
                "Authorization header required",
            ),
            AuthError::InvalidAuthorizationFormat => (
                StatusCode::FORBIDDEN,
                "INVALID_AUTHORIZATION",
                "Invalid authorization header format",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid or expired token",
            ),
            AuthError::UserNotFound => {
                (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND", "User not found")
            }
            AuthError::UserLoadError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "USER_LOAD_ERROR",
                "Failed to load user",
            ),
            AuthError::PasswordHashError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PASSWORD_HASH_ERROR",
                "Failed to process credentials",
            ),
            AuthError::TokenIssueError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TOKEN_ISSUE_ERROR",
                "Failed to issue token",
            ),
            AuthError::RefreshTokenReused => (
                StatusCode::UNAUTHORIZED,
                "REFRESH_TOKEN_REUSED",
                REFRESH_REUSE_DETAIL,
            ),
            AuthError::RefreshTokenExpired => (
                StatusCode::UNAUTHORIZED,
                "REFRESH_TOKEN_EXPIRED",
                "Refresh token expired",
            ),
            AuthError::StoreError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Failed to access credential store",
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuse_sentinel_is_distinct_from_invalid_token() {
        let reuse = AuthError::RefreshTokenReused.into_response();
        let invalid = AuthError::InvalidToken.into_response();
        assert_eq!(reuse.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        // Same status, distinct machine-readable code
        assert_ne!(
            format!("{:?}", AuthError::RefreshTokenReused),
            format!("{:?}", AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_missing_bearer_is_forbidden() {
        let resp = AuthError::MissingAuthorization.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
