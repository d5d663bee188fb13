//! Access token issuance and validation helpers

use axum::http::HeaderValue;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::AccessClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Issue a short-lived access token carrying the user id in `sub`
pub fn issue_access_token(user_id: i64, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now();
    let expires = now + Duration::minutes(config.access_token_expire_minutes);

    let claims = AccessClaims {
        sub: user_id.to_string(),
        iat: now.timestamp() as u64,
        exp: expires.timestamp() as u64,
    };

    let header = Header::new(config.algorithm);
    let key = EncodingKey::from_secret(config.jwt_secret.as_ref());
    encode(&header, &claims, &key).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign access token");
        AuthError::TokenIssueError
    })
}

/// Validate an access token and extract the user id.
///
/// Bad signature, missing subject, non-integer subject, and expiry all
/// collapse to `AuthError::InvalidToken`.
pub fn decode_access_token(token: &str, config: &AuthConfig) -> Result<i64, AuthError> {
    let validation = Validation::new(config.algorithm);
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_ref());

    let token_data = decode::<AccessClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Access token validation failed");
        AuthError::InvalidToken
    })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthError::InvalidToken)
}

/// Extract bearer token from Authorization header
pub(crate) fn extract_bearer_token(header: &HeaderValue) -> Result<String, AuthError> {
    let header_str = header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationFormat)?;

    if let Some(token) = header_str.strip_prefix("Bearer ") {
        Ok(token.to_string())
    } else {
        Err(AuthError::InvalidAuthorizationFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn test_config() -> AuthConfig {
        AuthConfig::new("test-secret-key".to_string(), "HS256", 15, 7)
    }

    #[test]
    fn test_extract_bearer_token() {
        // Valid bearer token
        let header = HeaderValue::from_static("Bearer abc123");
        let result = extract_bearer_token(&header);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "abc123");

        // Invalid format
        let header = HeaderValue::from_static("abc123");
        assert!(extract_bearer_token(&header).is_err());

        // Basic auth (wrong type)
        let header = HeaderValue::from_static("Basic abc123");
        assert!(extract_bearer_token(&header).is_err());
    }

    #[test]
    fn test_access_token_roundtrip() {
        let config = test_config();
        let token = issue_access_token(42, &config).expect("issue");
        let user_id = decode_access_token(&token, &config).expect("decode");
        assert_eq!(user_id, 42);
    }

    #[test]
    fn test_access_token_wrong_secret_rejected() {
        let config = test_config();
        let token = issue_access_token(42, &config).expect("issue");

        let other = AuthConfig::new("different-secret".to_string(), "HS256", 15, 7);
        let result = decode_access_token(&token, &other);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_access_token_expired_rejected() {
        // Negative TTL produces an already-expired token
        let config = AuthConfig::new("test-secret-key".to_string(), "HS256", -5, 7);
        let token = issue_access_token(42, &config).expect("issue");
        let result = decode_access_token(&token, &config);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_access_token_non_integer_subject_rejected() {
        let config = test_config();
        let now = Utc::now().timestamp() as u64;
        let claims = AccessClaims {
            sub: "not-a-number".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(config.algorithm),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_ref()),
        )
        .unwrap();

        let result = decode_access_token(&token, &config);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_access_token_garbage_rejected() {
        let config = test_config();
        assert!(matches!(
            decode_access_token("not.a.token", &config),
            Err(AuthError::InvalidToken)
        ));
    }
}
