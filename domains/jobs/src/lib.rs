//! Jobs domain: generation jobs, the queue worker pool, the live job
//! registry, and the SSE push channel.

pub mod api;
pub mod domain;
pub mod queue;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Job, JobKind, JobStatus};
pub use domain::registry::{JobRegistry, LiveJob, LiveJobUpdate, LiveStatus};
pub use domain::state::{JobEvent, JobState, JobStateMachine, StateError};

// Re-export repository types
pub use repository::{JobRepository, JobsRepositories};

// Re-export the queue worker
pub use queue::QueueWorker;

// Re-export API types
pub use api::routes;
pub use api::JobsState;
