//! Route definitions for the Assets domain API

use axum::{routing::get, Router};

use super::handlers::assets;
use super::middleware::AssetsState;

/// Create all Assets domain API routes
pub fn routes() -> Router<AssetsState> {
    Router::new()
        .route("/api/assets/", get(assets::list_assets))
        .route(
            "/api/assets/{id}",
            get(assets::get_asset).delete(assets::delete_asset),
        )
}
