//! Per-modality concurrency permits
//!
//! Vertex AI rate limits are per modality (image 60/min, video 10/min), so
//! concurrent remote calls are capped separately per modality. The permits
//! bound concurrent slots, not attempts: a permit is held across retries.

use tokio::sync::{Semaphore, SemaphorePermit};

/// Maximum concurrent image generation calls
pub const IMAGE_CONCURRENCY: usize = 10;
/// Maximum concurrent video generation calls
pub const VIDEO_CONCURRENCY: usize = 3;

/// Counting semaphores capping concurrent remote calls per modality.
///
/// Image and video capacity are independent and do not compete.
pub struct GenerationPermits {
    image: Semaphore,
    video: Semaphore,
}

impl Default for GenerationPermits {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationPermits {
    pub fn new() -> Self {
        Self {
            image: Semaphore::new(IMAGE_CONCURRENCY),
            video: Semaphore::new(VIDEO_CONCURRENCY),
        }
    }

    /// Acquire an image slot. The returned guard releases on drop, on every
    /// exit path including cancellation.
    pub async fn acquire_image(&self) -> SemaphorePermit<'_> {
        // The semaphore is never closed, so acquire cannot fail
        self.image
            .acquire()
            .await
            .expect("image semaphore closed unexpectedly")
    }

    /// Acquire a video slot
    pub async fn acquire_video(&self) -> SemaphorePermit<'_> {
        self.video
            .acquire()
            .await
            .expect("video semaphore closed unexpectedly")
    }

    pub fn image_available(&self) -> usize {
        self.image.available_permits()
    }

    pub fn video_available(&self) -> usize {
        self.video.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_permits_start_at_capacity() {
        let permits = GenerationPermits::new();
        assert_eq!(permits.image_available(), IMAGE_CONCURRENCY);
        assert_eq!(permits.video_available(), VIDEO_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let permits = GenerationPermits::new();
        {
            let _guard = permits.acquire_video().await;
            assert_eq!(permits.video_available(), VIDEO_CONCURRENCY - 1);
        }
        assert_eq!(permits.video_available(), VIDEO_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_modalities_do_not_compete() {
        let permits = GenerationPermits::new();
        let _image = permits.acquire_image().await;
        assert_eq!(permits.video_available(), VIDEO_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_video_concurrency_never_exceeds_cap() {
        let permits = Arc::new(GenerationPermits::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let permits = permits.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = permits.acquire_video().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= VIDEO_CONCURRENCY);
        assert_eq!(permits.video_available(), VIDEO_CONCURRENCY);
    }
}
