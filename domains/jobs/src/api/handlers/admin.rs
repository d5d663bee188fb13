//! Queue monitoring endpoint

use axum::{extract::State, Json};
use serde_json::json;

use lumagen_auth::CurrentUser;
use lumagen_common::Result;
use lumagen_vertex::{IMAGE_CONCURRENCY, VIDEO_CONCURRENCY};

use crate::api::middleware::JobsState;
use crate::domain::entities::JobStatus;

/// GET /api/admin/queue-status
///
/// Snapshot of the queueing system: permit availability per modality, the
/// in-memory FIFO depth, and durable job counts by status.
pub async fn queue_status(
    CurrentUser(_user): CurrentUser,
    State(state): State<JobsState>,
) -> Result<Json<serde_json::Value>> {
    let image_available = state.permits.image_available();
    let video_available = state.permits.video_available();

    let queued = state.repos.jobs.count_by_status(JobStatus::Queued).await?;
    let processing = state
        .repos
        .jobs
        .count_by_status(JobStatus::Processing)
        .await?;
    let completed = state
        .repos
        .jobs
        .count_by_status(JobStatus::Completed)
        .await?;
    let failed = state.repos.jobs.count_by_status(JobStatus::Failed).await?;

    Ok(Json(json!({
        "semaphore": {
            "image": {
                "max": IMAGE_CONCURRENCY,
                "available": image_available,
                "in_use": IMAGE_CONCURRENCY - image_available,
            },
            "video": {
                "max": VIDEO_CONCURRENCY,
                "available": video_available,
                "in_use": VIDEO_CONCURRENCY - video_available,
            },
        },
        "queue": {
            "pending": state.queue.pending_count(),
        },
        "jobs": {
            "queued": queued,
            "processing": processing,
            "completed": completed,
            "failed": failed,
        },
    })))
}
