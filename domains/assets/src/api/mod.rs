//! API layer for the Assets domain

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::AssetsState;
pub use routes::routes;
