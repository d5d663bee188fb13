//! Concrete authentication backend
//!
//! Wraps `PgPool` + `AuthConfig` and owns the auth-specific SQL query
//! (user lookup by id). Uses runtime `sqlx::query_as` consistent with the
//! repository pattern used by the domain crates.

use sqlx::PgPool;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::jwt::decode_access_token;

/// Lightweight identity for authenticated users.
///
/// Carries only the fields needed by handlers; domain code needing the
/// full `User` row loads it from its own repository.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthIdentity {
    pub id: i64,
    pub email: String,
    pub username: String,
}

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    pool: PgPool,
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(pool: PgPool, config: AuthConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Find user identity by id
    pub(crate) async fn find_user(&self, id: i64) -> Result<Option<AuthIdentity>, AuthError> {
        let user: Option<AuthIdentity> =
            sqlx::query_as("SELECT id, email, username FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, user_id = id, "Failed to load user");
                    AuthError::UserLoadError
                })?;

        Ok(user)
    }

    /// Authenticate a bearer access token and load its user
    pub async fn authenticate_bearer(&self, token: &str) -> Result<AuthIdentity, AuthError> {
        let user_id = decode_access_token(token, &self.config)?;
        self.find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
