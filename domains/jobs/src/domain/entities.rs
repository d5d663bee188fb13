//! Job domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use lumagen_assets::AssetKind;
use lumagen_common::Result;

use crate::domain::state::{JobEvent, JobState, JobStateMachine};

/// Durable job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Check if status is terminal (job has finished)
    pub fn is_terminal(&self) -> bool {
        self.to_state().is_terminal()
    }

    /// Convert to state machine state
    pub fn to_state(&self) -> JobState {
        match self {
            JobStatus::Queued => JobState::Queued,
            JobStatus::Processing => JobState::Processing,
            JobStatus::Completed => JobState::Completed,
            JobStatus::Failed => JobState::Failed,
        }
    }

    /// Create from state machine state
    pub fn from_state(state: JobState) -> Self {
        match state {
            JobState::Queued => JobStatus::Queued,
            JobState::Processing => JobStatus::Processing,
            JobState::Completed => JobStatus::Completed,
            JobState::Failed => JobStatus::Failed,
        }
    }
}

/// Generation modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_kind", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    TextToImage,
    TextToVideo,
    ImageToVideo,
}

impl JobKind {
    /// The asset modality this job produces
    pub fn asset_kind(&self) -> AssetKind {
        match self {
            JobKind::TextToImage => AssetKind::Image,
            JobKind::TextToVideo | JobKind::ImageToVideo => AssetKind::Video,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::TextToImage => write!(f, "text-to-image"),
            JobKind::TextToVideo => write!(f, "text-to-video"),
            JobKind::ImageToVideo => write!(f, "image-to-video"),
        }
    }
}

/// Job entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub user_id: i64,
    pub kind: JobKind,
    pub prompt: String,
    pub model: String,
    /// Provider-specific option bag; empty object when no options were given
    pub options: Json<serde_json::Value>,
    /// Staged reference image (image-to-video only)
    pub image_path: Option<String>,
    pub image_mime_type: Option<String>,
    pub status: JobStatus,
    pub asset_id: Option<i64>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new queued job
    pub fn new(
        id: Uuid,
        user_id: i64,
        kind: JobKind,
        prompt: String,
        model: String,
        options: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Job {
            id,
            user_id,
            kind,
            prompt,
            model,
            options: Json(options),
            image_path: None,
            image_mime_type: None,
            status: JobStatus::default(),
            asset_id: None,
            result_url: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a staged reference image (image-to-video)
    pub fn with_reference_image(mut self, path: String, mime_type: String) -> Self {
        self.image_path = Some(path);
        self.image_mime_type = Some(mime_type);
        self
    }

    /// Check if job is terminal
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Start job processing
    pub fn start(&mut self) -> Result<()> {
        let next = self.apply_transition(JobEvent::WorkerPicksUp)?;
        self.status = JobStatus::from_state(next);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Complete job successfully
    pub fn complete(&mut self, asset_id: i64, result_url: String) -> Result<()> {
        let next = self.apply_transition(JobEvent::Success)?;
        self.status = JobStatus::from_state(next);
        self.asset_id = Some(asset_id);
        self.result_url = Some(result_url);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Fail job with a user-visible message
    pub fn fail(&mut self, error_message: String) -> Result<()> {
        let next = self.apply_transition(JobEvent::Failure)?;
        self.status = JobStatus::from_state(next);
        self.error_message = Some(error_message);
        self.updated_at = Utc::now();
        Ok(())
    }

    fn apply_transition(&self, event: JobEvent) -> Result<JobState> {
        JobStateMachine::transition(self.status.to_state(), event)
            .map_err(|e| lumagen_common::Error::Conflict(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_job() -> Job {
        Job::new(
            Uuid::new_v4(),
            1,
            JobKind::TextToImage,
            "a sword".to_string(),
            "imagen-3.0-fast-generate-001".to_string(),
            json!({}),
        )
    }

    #[test]
    fn test_new_job_is_queued() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(!job.is_terminal());
        assert!(job.asset_id.is_none());
    }

    #[test]
    fn test_lifecycle_to_completed() {
        let mut job = sample_job();
        job.start().unwrap();
        assert_eq!(job.status, JobStatus::Processing);

        job.complete(7, "/storage/images/x.png".to_string()).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.asset_id, Some(7));
        assert!(job.is_terminal());
    }

    #[test]
    fn test_lifecycle_to_failed() {
        let mut job = sample_job();
        job.start().unwrap();
        job.fail("provider refused".to_string()).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("provider refused"));
    }

    #[test]
    fn test_terminal_job_cannot_restart() {
        let mut job = sample_job();
        job.start().unwrap();
        job.complete(1, "/storage/images/y.png".to_string()).unwrap();
        assert!(job.start().is_err());
        assert!(job.fail("late".to_string()).is_err());
    }

    #[test]
    fn test_kind_maps_to_asset_kind() {
        assert_eq!(JobKind::TextToImage.asset_kind(), AssetKind::Image);
        assert_eq!(JobKind::TextToVideo.asset_kind(), AssetKind::Video);
        assert_eq!(JobKind::ImageToVideo.asset_kind(), AssetKind::Video);
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&JobKind::TextToImage).unwrap(),
            "\"text-to-image\""
        );
        assert_eq!(
            serde_json::to_string(&JobKind::ImageToVideo).unwrap(),
            "\"image-to-video\""
        );
    }
}
