//! Route definitions for the Jobs domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{admin, generate};
use super::middleware::JobsState;

/// Create all Jobs domain API routes
pub fn routes() -> Router<JobsState> {
    Router::new()
        .route("/api/generate/text-to-image", post(generate::text_to_image))
        .route("/api/generate/text-to-video", post(generate::text_to_video))
        .route("/api/generate/image-to-video", post(generate::image_to_video))
        .route("/api/generate/jobs/{id}", get(generate::job_status))
        .route("/api/generate/jobs/{id}/stream", get(generate::stream_job))
        .route("/api/admin/queue-status", get(admin::queue_status))
}
