//! Authentication for Lumagen
//!
//! Provides password hashing (argon2), signed access tokens (HS256),
//! opaque refresh tokens, and the axum extractor used by protected routes.

pub mod backend;
pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jwt;
pub mod password;
pub mod tokens;

pub use backend::{AuthBackend, AuthIdentity};
pub use claims::AccessClaims;
pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::CurrentUser;
pub use jwt::{decode_access_token, issue_access_token};
pub use password::{hash_password, verify_password};
pub use tokens::mint_refresh_token;
