//! Assets domain: persisted artifacts and their filesystem storage

pub mod api;
pub mod domain;
pub mod repository;
pub mod storage;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{normalize_prompt, Asset, AssetKind, NewAsset};

// Re-export repository types
pub use repository::{AssetRepository, AssetsRepositories};

// Re-export storage
pub use storage::ArtifactStorage;

// Re-export API types
pub use api::routes;
pub use api::AssetsState;
