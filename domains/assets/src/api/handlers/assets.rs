//! Asset management API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use lumagen_auth::CurrentUser;
use lumagen_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::api::middleware::AssetsState;
use crate::domain::entities::{Asset, AssetKind};

/// Asset response DTO
#[derive(Debug, Serialize)]
pub struct AssetResponse {
    pub id: i64,
    pub job_id: Uuid,
    pub file_path: String,
    pub prompt: String,
    pub model: String,
    pub kind: AssetKind,
    pub created_at: DateTime<Utc>,
}

impl From<Asset> for AssetResponse {
    fn from(a: Asset) -> Self {
        Self {
            id: a.id,
            job_id: a.job_id,
            file_path: a.file_path,
            prompt: a.prompt,
            model: a.model,
            kind: a.kind,
            created_at: a.created_at,
        }
    }
}

/// Query parameters for listing assets
#[derive(Debug, Deserialize)]
pub struct ListAssetsParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// List the authenticated user's assets, newest first
pub async fn list_assets(
    CurrentUser(user): CurrentUser,
    State(state): State<AssetsState>,
    Query(params): Query<ListAssetsParams>,
) -> Result<Json<Vec<AssetResponse>>> {
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let assets = state.repos.assets.list_by_user(user.id, skip, limit).await?;
    Ok(Json(assets.into_iter().map(Into::into).collect()))
}

/// Get a single asset by id.
///
/// A foreign asset returns 404, never 403, so ids cannot be probed for
/// existence.
pub async fn get_asset(
    CurrentUser(user): CurrentUser,
    State(state): State<AssetsState>,
    Path(id): Path<i64>,
) -> Result<Json<AssetResponse>> {
    let asset = state
        .repos
        .assets
        .find_for_user(id, user.id)
        .await?
        .ok_or_else(|| Error::NotFound("Asset not found".to_string()))?;

    Ok(Json(asset.into()))
}

/// Delete an asset: removes the row and the stored file.
/// Deleting the file is idempotent; deleting the row is not, so the second
/// call for the same id returns 404.
pub async fn delete_asset(
    CurrentUser(user): CurrentUser,
    State(state): State<AssetsState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let asset = state
        .repos
        .assets
        .find_for_user(id, user.id)
        .await?
        .ok_or_else(|| Error::NotFound("Asset not found".to_string()))?;

    if let Err(e) = state.storage.delete_by_url(&asset.file_path).await {
        tracing::warn!(error = %e, asset_id = id, "Failed to delete artifact file");
    }

    state.repos.assets.delete(id).await?;
    Ok(Json(json!({})))
}
