//! Jobs domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;

use lumagen_assets::{ArtifactStorage, AssetsRepositories};
use lumagen_auth::AuthBackend;
use lumagen_vertex::GenerationPermits;

use crate::domain::registry::JobRegistry;
use crate::queue::QueueWorker;
use crate::repository::JobsRepositories;

/// Application state for the Jobs domain
#[derive(Clone)]
pub struct JobsState {
    pub repos: JobsRepositories,
    pub assets: AssetsRepositories,
    pub registry: Arc<JobRegistry>,
    pub queue: Arc<QueueWorker>,
    pub auth: AuthBackend,
    pub storage: ArtifactStorage,
    pub permits: Arc<GenerationPermits>,
}

impl FromRef<JobsState> for AuthBackend {
    fn from_ref(state: &JobsState) -> Self {
        state.auth.clone()
    }
}
