//! Opaque refresh token minting

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::AuthError;

/// Mint a fresh opaque refresh token: 256 bits of OS randomness,
/// base64url-encoded without padding.
pub fn mint_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "Failed to read OS randomness for refresh token");
        AuthError::TokenIssueError
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_opaque() {
        let a = mint_refresh_token().expect("mint");
        let b = mint_refresh_token().expect("mint");
        assert_ne!(a, b);
        // 32 bytes -> 43 base64url chars, comfortably above the 128-bit floor
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }
}
