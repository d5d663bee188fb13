//! Lumagen application composition root
//!
//! Builds one instance of every component at startup — repositories, auth
//! backend, artifact storage, permits, generation backend, live registry,
//! and the queue worker — and composes the domain routers into a single
//! application. No lazy global initialization.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tower_http::services::ServeDir;

use lumagen_accounts::{AccountsRepositories, AccountsState};
use lumagen_assets::{ArtifactStorage, AssetsRepositories, AssetsState};
use lumagen_auth::{AuthBackend, AuthConfig};
use lumagen_common::Settings;
use lumagen_jobs::{JobRegistry, JobsRepositories, JobsState, QueueWorker};
use lumagen_vertex::GenerationPermits;

/// The composed application: router plus the queue worker handle the binary
/// uses to start recovery/workers and to stop them on shutdown.
pub struct App {
    pub router: Router,
    pub queue: Arc<QueueWorker>,
}

/// Create the main application with all routes and shared state
pub async fn create_app(settings: &Settings, pool: PgPool) -> Result<App, anyhow::Error> {
    // Artifact storage and its directory layout
    let storage = ArtifactStorage::new(&settings.storage_path);
    storage
        .ensure_layout()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare storage layout: {}", e))?;

    // Auth backend
    let auth_config = AuthConfig::new(
        settings.jwt_secret_key.clone(),
        &settings.jwt_algorithm,
        settings.access_token_expire_minutes,
        settings.refresh_token_expire_days,
    );
    let auth_backend = AuthBackend::new(pool.clone(), auth_config);

    // Generation backend behind the per-modality permits
    let permits = Arc::new(GenerationPermits::new());
    let backend = lumagen_vertex::create_backend(settings, permits.clone())
        .map_err(|e| anyhow::anyhow!("Failed to create generation backend: {}", e))?;

    // Repositories
    let accounts_repos = AccountsRepositories::new(pool.clone());
    let assets_repos = AssetsRepositories::new(pool.clone());
    let jobs_repos = JobsRepositories::new(pool);

    // Live registry and queue worker
    let registry = Arc::new(JobRegistry::new());
    let queue = Arc::new(QueueWorker::new(
        jobs_repos.jobs.clone(),
        assets_repos.assets.clone(),
        registry.clone(),
        backend,
        storage.clone(),
    ));

    // Domain states
    let accounts_state = AccountsState {
        repos: accounts_repos,
        auth: auth_backend.clone(),
    };
    let assets_state = AssetsState {
        repos: assets_repos.clone(),
        auth: auth_backend.clone(),
        storage: storage.clone(),
    };
    let jobs_state = JobsState {
        repos: jobs_repos,
        assets: assets_repos,
        registry,
        queue: queue.clone(),
        auth: auth_backend,
        storage: storage.clone(),
        permits,
    };

    // Build router — domain routers plus shared infrastructure routes
    let router = Router::new()
        .route("/health", get(health_check))
        .nest_service("/storage", ServeDir::new(storage.root()))
        .merge(lumagen_accounts::routes().with_state(accounts_state))
        .merge(lumagen_assets::routes().with_state(assets_state))
        .merge(lumagen_jobs::routes().with_state(jobs_state));

    Ok(App { router, queue })
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy"}))
}
