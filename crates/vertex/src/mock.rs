//! Mock generation backend for load testing
//!
//! Returns a stub artifact after a uniform random 2–6 s delay, so the queue,
//! permits, and push channel can be exercised without provider quota. The
//! permits are still acquired, which keeps the concurrency shaping under test.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::permits::GenerationPermits;
use crate::{GenerationBackend, GenerationError, ReferenceImage};

/// 1x1 transparent PNG
const STUB_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x62, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Minimal MP4 file-type box
const STUB_MP4: &[u8] = &[
    0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70, 0x69, 0x73, 0x6f, 0x6d, 0x00, 0x00, 0x02,
    0x00, 0x69, 0x73, 0x6f, 0x6d, 0x69, 0x73, 0x6f, 0x32,
];

const MIN_DELAY_MS: u64 = 2_000;
const MAX_DELAY_MS: u64 = 6_000;

/// Load-test backend returning stub artifacts
pub struct MockBackend {
    permits: Arc<GenerationPermits>,
}

impl MockBackend {
    pub fn new(permits: Arc<GenerationPermits>) -> Self {
        Self { permits }
    }

    async fn simulate_latency(&self) {
        let delay = fastrand::u64(MIN_DELAY_MS..=MAX_DELAY_MS);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait::async_trait]
impl GenerationBackend for MockBackend {
    async fn generate_image(
        &self,
        prompt: &str,
        model: &str,
        _options: &Value,
    ) -> Result<Vec<u8>, GenerationError> {
        let _permit = self.permits.acquire_image().await;
        tracing::debug!(prompt, model, "Mock image generation");
        self.simulate_latency().await;
        Ok(STUB_PNG.to_vec())
    }

    async fn generate_video(
        &self,
        prompt: &str,
        model: &str,
        _reference_image: Option<ReferenceImage>,
        _options: &Value,
    ) -> Result<Vec<u8>, GenerationError> {
        let _permit = self.permits.acquire_video().await;
        tracing::debug!(prompt, model, "Mock video generation");
        self.simulate_latency().await;
        Ok(STUB_MP4.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_mock_returns_stub_png() {
        let backend = MockBackend::new(Arc::new(GenerationPermits::new()));
        let bytes = backend
            .generate_image("a sword", "imagen-3.0-fast-generate-001", &json!({}))
            .await
            .expect("mock image");
        // PNG magic
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_returns_stub_mp4() {
        let backend = MockBackend::new(Arc::new(GenerationPermits::new()));
        let bytes = backend
            .generate_video("a sunset", "veo-3.0-fast-generate-001", None, &json!({}))
            .await
            .expect("mock video");
        // ftyp box
        assert_eq!(&bytes[4..8], b"ftyp");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_releases_permits() {
        let permits = Arc::new(GenerationPermits::new());
        let backend = MockBackend::new(permits.clone());
        backend
            .generate_image("a sword", "imagen-3.0-fast-generate-001", &json!({}))
            .await
            .expect("mock image");
        assert_eq!(permits.image_available(), crate::IMAGE_CONCURRENCY);
    }
}
