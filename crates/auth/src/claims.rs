//! Access token claims

use serde::{Deserialize, Serialize};

/// Claims carried by a Lumagen access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id, stringified)
    pub sub: String,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
}
