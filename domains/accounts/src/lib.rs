//! Accounts domain: users, refresh tokens, auth endpoints

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{RefreshToken, User};

// Re-export repository types
pub use repository::{AccountsRepositories, RefreshTokenRepository, UserRepository};

// Re-export API types
pub use api::routes;
pub use api::AccountsState;
