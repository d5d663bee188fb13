//! Asset domain entities
//!
//! An asset is the persisted record of a produced artifact: who owns it,
//! which job produced it, where the file lives, and the fingerprint fields
//! used for cache lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asset kind (modality of the stored artifact)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Image => write!(f, "image"),
            AssetKind::Video => write!(f, "video"),
        }
    }
}

/// Persisted artifact record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Asset {
    pub id: i64,
    pub user_id: i64,
    pub job_id: Uuid,
    /// Storage-relative URL under `/storage/`
    pub file_path: String,
    /// Normalized prompt (trimmed + lowercased), part of the cache fingerprint
    pub prompt: String,
    pub model: String,
    pub kind: AssetKind,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new asset row
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub user_id: i64,
    pub job_id: Uuid,
    pub file_path: String,
    pub prompt: String,
    pub model: String,
    pub kind: AssetKind,
}

/// Normalize a prompt for fingerprinting: trim outer whitespace, lowercase.
pub fn normalize_prompt(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prompt_trims_and_lowercases() {
        assert_eq!(normalize_prompt("  A Sword  "), "a sword");
        assert_eq!(normalize_prompt("already normal"), "already normal");
        assert_eq!(normalize_prompt("\tMiXeD\n"), "mixed");
    }

    #[test]
    fn test_normalize_prompt_preserves_inner_whitespace() {
        assert_eq!(normalize_prompt("  two   spaces  "), "two   spaces");
    }
}
