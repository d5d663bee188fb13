//! Asset repository

use crate::domain::entities::{normalize_prompt, Asset, AssetKind, NewAsset};
use lumagen_common::Result;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new asset row. The prompt is normalized before insertion so
    /// cache lookups by fingerprint always match.
    pub async fn create(&self, new_asset: &NewAsset) -> Result<Asset> {
        let row = sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (user_id, job_id, file_path, prompt, model, kind, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id, user_id, job_id, file_path, prompt, model, kind, created_at
            "#,
        )
        .bind(new_asset.user_id)
        .bind(new_asset.job_id)
        .bind(&new_asset.file_path)
        .bind(normalize_prompt(&new_asset.prompt))
        .bind(&new_asset.model)
        .bind(new_asset.kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Find the newest asset matching the `(normalized prompt, model, kind)`
    /// fingerprint. Duplicates may exist; newest wins.
    pub async fn find_cached(
        &self,
        prompt: &str,
        model: &str,
        kind: AssetKind,
    ) -> Result<Option<Asset>> {
        let row = sqlx::query_as::<_, Asset>(
            r#"
            SELECT id, user_id, job_id, file_path, prompt, model, kind, created_at
            FROM assets
            WHERE prompt = $1 AND model = $2 AND kind = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(normalize_prompt(prompt))
        .bind(model)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// List a user's assets, newest first
    pub async fn list_by_user(&self, user_id: i64, skip: i64, limit: i64) -> Result<Vec<Asset>> {
        let rows = sqlx::query_as::<_, Asset>(
            r#"
            SELECT id, user_id, job_id, file_path, prompt, model, kind, created_at
            FROM assets
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Find an asset by id, scoped to its owner
    pub async fn find_for_user(&self, id: i64, user_id: i64) -> Result<Option<Asset>> {
        let row = sqlx::query_as::<_, Asset>(
            r#"
            SELECT id, user_id, job_id, file_path, prompt, model, kind, created_at
            FROM assets
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete an asset row by id
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
