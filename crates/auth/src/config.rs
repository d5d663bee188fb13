//! Auth configuration

use jsonwebtoken::Algorithm;
use std::str::FromStr;

/// Token issuance and verification parameters
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        algorithm: &str,
        access_token_expire_minutes: i64,
        refresh_token_expire_days: i64,
    ) -> Self {
        Self {
            jwt_secret,
            algorithm: Algorithm::from_str(algorithm).unwrap_or(Algorithm::HS256),
            access_token_expire_minutes,
            refresh_token_expire_days,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("algorithm", &self.algorithm)
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field("refresh_token_expire_days", &self.refresh_token_expire_days)
            .finish()
    }
}
