//! Vertex AI generation adapter
//!
//! Provides media generation via two Vertex AI surfaces:
//! - Imagen `:predict` — synchronous image generation with retry/backoff
//! - Veo `:predictLongRunning` / `:fetchPredictOperation` — the LRO
//!   start-and-poll protocol for video generation
//!
//! Per-modality concurrency permits live here too, since they shape the
//! remote calls and nothing else. `LOAD_TEST_MODE=true` swaps the real
//! client for a mock that returns a stub artifact after a random delay.

pub mod client;
pub mod extract;
pub mod gcp_auth;
pub mod mock;
pub mod permits;
pub mod safety;

use std::sync::Arc;

use lumagen_common::Settings;
use serde_json::Value;
use thiserror::Error;

pub use client::VertexAiBackend;
pub use mock::MockBackend;
pub use permits::{GenerationPermits, IMAGE_CONCURRENCY, VIDEO_CONCURRENCY};

/// Default model tags used when a submission does not name one
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-fast-generate-001";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.0-fast-generate-001";

#[derive(Error, Debug)]
pub enum GenerationError {
    /// 429/503/500-class provider signals; retried inside the adapter
    #[error("Retryable provider error: {0}")]
    Retryable(String),

    /// Provider refused the content; message is the fixed user-facing sentence
    #[error("{0}")]
    Safety(String),

    /// Non-retryable provider error; surfaced verbatim
    #[error("{0}")]
    Remote(String),

    /// The video operation did not finish within the polling window
    #[error("Video generation timed out after {0} seconds")]
    Timeout(u64),

    /// Credential acquisition or signing failed
    #[error("Provider authentication error: {0}")]
    Auth(String),
}

/// Reference image for image-to-video generation
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Remote generation backend.
///
/// Implementations acquire the matching modality permit around the remote
/// call only, and hold it across retries.
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate an image from a prompt. Returns raw PNG bytes.
    async fn generate_image(
        &self,
        prompt: &str,
        model: &str,
        options: &Value,
    ) -> Result<Vec<u8>, GenerationError>;

    /// Generate a video from a prompt and optional reference image.
    /// Returns raw MP4 bytes.
    async fn generate_video(
        &self,
        prompt: &str,
        model: &str,
        reference_image: Option<ReferenceImage>,
        options: &Value,
    ) -> Result<Vec<u8>, GenerationError>;
}

/// Build the configured generation backend.
///
/// `LOAD_TEST_MODE=true` selects the mock; otherwise the real Vertex AI
/// client is constructed from the Google Cloud settings.
pub fn create_backend(
    settings: &Settings,
    permits: Arc<GenerationPermits>,
) -> Result<Arc<dyn GenerationBackend>, GenerationError> {
    if settings.load_test_mode {
        tracing::info!("LOAD_TEST_MODE enabled, using mock generation backend");
        return Ok(Arc::new(MockBackend::new(permits)));
    }

    let backend = VertexAiBackend::new(
        &settings.google_cloud_project,
        &settings.google_cloud_region,
        settings.google_application_credentials.as_deref(),
        permits,
    )?;
    Ok(Arc::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_messages_are_user_visible() {
        let e = GenerationError::Timeout(600);
        assert_eq!(
            e.to_string(),
            "Video generation timed out after 600 seconds"
        );

        let e = GenerationError::Remote("Client error 400: bad request".to_string());
        assert_eq!(e.to_string(), "Client error 400: bad request");
    }

    #[test]
    fn test_default_models() {
        assert!(DEFAULT_IMAGE_MODEL.starts_with("imagen-"));
        assert!(DEFAULT_VIDEO_MODEL.starts_with("veo-"));
    }
}
