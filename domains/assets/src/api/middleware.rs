//! Assets domain state and auth backend integration

use crate::repository::AssetsRepositories;
use crate::storage::ArtifactStorage;
use axum::extract::FromRef;
use lumagen_auth::AuthBackend;

/// Application state for the Assets domain
#[derive(Clone)]
pub struct AssetsState {
    pub repos: AssetsRepositories,
    pub auth: AuthBackend,
    pub storage: ArtifactStorage,
}

impl FromRef<AssetsState> for AuthBackend {
    fn from_ref(state: &AssetsState) -> Self {
        state.auth.clone()
    }
}
