//! Service-account OAuth2 token provider
//!
//! Exchanges a signed RS256 JWT assertion for a cloud-platform access token
//! at the service account's token endpoint. Tokens are cached until shortly
//! before expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::GenerationError;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh this long before the reported expiry
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Subset of the service-account key file the token exchange needs
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Caching access-token provider for a single service account
pub struct GcpTokenProvider {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GcpTokenProvider {
    /// Load the service-account key from a credentials JSON file
    pub fn from_credentials_file(path: &str) -> Result<Self, GenerationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Auth(format!("Failed to read credentials file {}: {}", path, e))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)
            .map_err(|e| GenerationError::Auth(format!("Malformed credentials file: {}", e)))?;

        Ok(Self {
            key,
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, exchanging a fresh assertion if the
    /// cached one is absent or about to expire.
    pub async fn token(&self) -> Result<String, GenerationError> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if entry.expires_at > Utc::now() + Duration::seconds(EXPIRY_LEEWAY_SECS) {
                return Ok(entry.token.clone());
            }
        }

        let (token, expires_at) = self.exchange().await?;
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }

    async fn exchange(&self) -> Result<(String, DateTime<Utc>), GenerationError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp() as u64,
            exp: (now + Duration::hours(1)).timestamp() as u64,
        };

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| GenerationError::Auth(format!("Invalid service-account key: {}", e)))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| GenerationError::Auth(format!("Failed to sign assertion: {}", e)))?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| GenerationError::Auth(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Auth(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Auth(format!("Malformed token response: {}", e)))?;

        tracing::debug!(expires_in = token.expires_in, "Obtained access token");
        let expires_at = now + Duration::seconds(token.expires_in);
        Ok((token.access_token, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_file_is_an_auth_error() {
        let result = GcpTokenProvider::from_credentials_file("/nonexistent/creds.json");
        assert!(matches!(result, Err(GenerationError::Auth(_))));
    }
}
