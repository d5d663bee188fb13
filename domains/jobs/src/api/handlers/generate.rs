//! Generation API handlers
//!
//! Submission endpoints for the three modalities, the job status endpoint,
//! and the SSE push channel streaming live state transitions.

use std::convert::Infallible;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderName},
    response::sse::{Event, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use lumagen_auth::CurrentUser;
use lumagen_common::{Error, Result, ValidatedJson};
use lumagen_vertex::{DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL};

use crate::api::middleware::JobsState;
use crate::domain::entities::{Job, JobKind};
use crate::domain::registry::{LiveJob, LiveJobUpdate, LiveStatus};

/// Imagen option bag. Every field is optional; setting any of them bypasses
/// the result cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ImageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<ImageAspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[validate(range(min = 1, max = 2147483647))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_filter_level: Option<SafetyFilterLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_watermark: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<PromptLanguage>,
}

impl ImageOptions {
    /// Cross-field rule: a seeded generation cannot be watermarked, the
    /// provider rejects the combination.
    pub fn check(&self) -> Result<()> {
        if self.seed.is_some() && self.add_watermark == Some(true) {
            return Err(Error::Validation(
                "add_watermark must be false when seed is set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Veo option bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct VideoOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<VideoAspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[validate(range(min = 0, max = 4294967295i64))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_audio: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<VideoResolution>,
}

impl VideoOptions {
    pub fn check(&self) -> Result<()> {
        if let Some(duration) = self.duration_seconds {
            if !matches!(duration, 4 | 6 | 8) {
                return Err(Error::Validation(
                    "duration_seconds must be one of 4, 6, 8".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageAspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoAspectRatio {
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyFilterLevel {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptLanguage {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "en")]
    En,
    #[serde(rename = "ko")]
    Ko,
    #[serde(rename = "ja")]
    Ja,
    #[serde(rename = "zh")]
    Zh,
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "hi")]
    Hi,
    #[serde(rename = "pt")]
    Pt,
    #[serde(rename = "es")]
    Es,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoResolution {
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

/// Request for text-to-image generation
#[derive(Debug, Deserialize, Validate)]
pub struct ImageGenerationRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub model: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub options: ImageOptions,
}

/// Request for text-to-video generation
#[derive(Debug, Deserialize, Validate)]
pub struct VideoGenerationRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub model: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub options: VideoOptions,
}

/// Response for generation submissions
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub job_id: Uuid,
    pub status: LiveStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}

impl GenerationResponse {
    fn pending(job_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            status: LiveStatus::Pending,
            created_at,
            asset_id: None,
            result_url: None,
        }
    }
}

/// Snapshot of a job's state, as returned by the status endpoint and each
/// SSE frame
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: LiveStatus,
    pub asset_id: Option<i64>,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
}

impl From<&LiveJob> for JobStatusResponse {
    fn from(job: &LiveJob) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status,
            asset_id: job.asset_id,
            result_url: job.result_url.clone(),
            error_message: job.error_message.clone(),
        }
    }
}

/// POST /api/generate/text-to-image
pub async fn text_to_image(
    CurrentUser(user): CurrentUser,
    State(state): State<JobsState>,
    ValidatedJson(req): ValidatedJson<ImageGenerationRequest>,
) -> Result<Json<GenerationResponse>> {
    req.options.check()?;
    let model = req
        .model
        .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());

    // Only an option-free submission may be served from the cache; any
    // option changes the output for the same prompt.
    if req.options.is_default() {
        if let Some(response) = serve_from_cache(&state, &req.prompt, &model, JobKind::TextToImage).await? {
            return Ok(Json(response));
        }
    }

    submit(
        &state,
        user.id,
        JobKind::TextToImage,
        req.prompt,
        model,
        serde_json::to_value(&req.options)?,
    )
    .await
}

/// POST /api/generate/text-to-video
pub async fn text_to_video(
    CurrentUser(user): CurrentUser,
    State(state): State<JobsState>,
    ValidatedJson(req): ValidatedJson<VideoGenerationRequest>,
) -> Result<Json<GenerationResponse>> {
    req.options.check()?;
    let model = req
        .model
        .unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string());

    if req.options.is_default() {
        if let Some(response) = serve_from_cache(&state, &req.prompt, &model, JobKind::TextToVideo).await? {
            return Ok(Json(response));
        }
    }

    submit(
        &state,
        user.id,
        JobKind::TextToVideo,
        req.prompt,
        model,
        serde_json::to_value(&req.options)?,
    )
    .await
}

/// POST /api/generate/image-to-video (multipart)
///
/// Fields: `prompt`, `model`, `image` (png or jpeg), plus any video options
/// as text fields. The reference image is staged under `temp/` and removed
/// by the worker after the job's terminal transition.
pub async fn image_to_video(
    CurrentUser(user): CurrentUser,
    State(state): State<JobsState>,
    mut multipart: Multipart,
) -> Result<Json<GenerationResponse>> {
    let mut prompt: Option<String> = None;
    let mut model: Option<String> = None;
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut option_fields = serde_json::Map::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "prompt" => prompt = Some(read_text_field(field).await?),
            "model" => model = Some(read_text_field(field).await?),
            "image" => {
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("Invalid image upload: {}", e)))?;
                image = Some((bytes.to_vec(), mime_type));
            }
            _ => {
                // Remaining text fields are video options; numbers and bools
                // arrive as text and are re-parsed as JSON scalars
                let text = read_text_field(field).await?;
                let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
                option_fields.insert(name, value);
            }
        }
    }

    let prompt = prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| Error::Validation("prompt is required".to_string()))?;
    let (image_bytes, mime_type) =
        image.ok_or_else(|| Error::Validation("image file is required".to_string()))?;
    let extension = match mime_type.as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        other => {
            return Err(Error::Validation(format!(
                "Unsupported image type '{}': expected image/png or image/jpeg",
                other
            )));
        }
    };

    let options: VideoOptions = serde_json::from_value(Value::Object(option_fields))
        .map_err(|e| Error::Validation(format!("Invalid options: {}", e)))?;
    options
        .validate()
        .map_err(|e| Error::Validation(format!("Validation failed: {}", e)))?;
    options.check()?;

    let model = model.unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string());
    let job_id = Uuid::new_v4();

    let image_path = state
        .storage
        .write_temp_reference(job_id, extension, &image_bytes)
        .await?;

    let job = Job::new(
        job_id,
        user.id,
        JobKind::ImageToVideo,
        prompt,
        model,
        serde_json::to_value(&options)?,
    )
    .with_reference_image(image_path.to_string_lossy().into_owned(), mime_type);

    let created = state.repos.jobs.create(&job).await?;
    state.registry.create(job_id);
    state.queue.enqueue(job_id);

    Ok(Json(GenerationResponse::pending(job_id, created.created_at)))
}

/// GET /api/generate/jobs/{id} — current job snapshot.
/// The live registry answers for jobs from this process's uptime; older
/// terminal jobs fall back to the durable store.
pub async fn job_status(
    State(state): State<JobsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>> {
    if let Some(live) = state.registry.get(id) {
        return Ok(Json(JobStatusResponse::from(&live)));
    }

    let job = state
        .repos
        .jobs
        .find(id)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status.into(),
        asset_id: job.asset_id,
        result_url: job.result_url,
        error_message: job.error_message,
    }))
}

/// GET /api/generate/jobs/{id}/stream — SSE push channel.
///
/// Emits one snapshot on connect, then one per state transition, closing
/// after the first terminal snapshot. No heartbeats; clients reconnect on
/// their own timeout.
pub async fn stream_job(
    State(state): State<JobsState>,
    Path(id): Path<Uuid>,
) -> Result<(
    [(HeaderName, &'static str); 3],
    Sse<impl futures_core::Stream<Item = std::result::Result<Event, Infallible>>>,
)> {
    let Some((snapshot, mut changes)) = state.registry.watch(id) else {
        return Err(Error::NotFound("Job not found".to_string()));
    };

    let registry = state.registry.clone();
    let stream = async_stream::stream! {
        let mut current = snapshot;
        loop {
            let frame = serde_json::to_string(&JobStatusResponse::from(&current))
                .unwrap_or_else(|_| "{}".to_string());
            yield Ok(Event::default().data(frame));

            if current.status.is_terminal() {
                break;
            }
            // Edge-triggered wait: coalesced if several updates landed
            if changes.changed().await.is_err() {
                break;
            }
            match registry.get(id) {
                Some(job) => current = job,
                None => break,
            }
        }
    };

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(stream),
    ))
}

/// Serve a previously completed asset for an identical fingerprint, if any.
/// The returned job id is registered as a completed live job so the status
/// and stream endpoints answer for it.
async fn serve_from_cache(
    state: &JobsState,
    prompt: &str,
    model: &str,
    kind: JobKind,
) -> Result<Option<GenerationResponse>> {
    let Some(asset) = state
        .assets
        .assets
        .find_cached(prompt, model, kind.asset_kind())
        .await?
    else {
        return Ok(None);
    };

    let job_id = Uuid::new_v4();
    let live = state.registry.create(job_id);
    state.registry.update(
        job_id,
        LiveJobUpdate::completed(asset.id, asset.file_path.clone()),
    );

    tracing::info!(
        job_id = %job_id,
        asset_id = asset.id,
        kind = %kind,
        "Cache hit, served existing asset"
    );

    Ok(Some(GenerationResponse {
        job_id,
        status: LiveStatus::Completed,
        created_at: live.created_at,
        asset_id: Some(asset.id),
        result_url: Some(asset.file_path),
    }))
}

/// Create the durable row, the live entry, and enqueue the id
async fn submit(
    state: &JobsState,
    user_id: i64,
    kind: JobKind,
    prompt: String,
    model: String,
    options: Value,
) -> Result<Json<GenerationResponse>> {
    let job_id = Uuid::new_v4();
    let job = Job::new(job_id, user_id, kind, prompt, model, options);

    let created = state.repos.jobs.create(&job).await?;
    state.registry.create(job_id);
    state.queue.enqueue(job_id);

    Ok(Json(GenerationResponse::pending(job_id, created.created_at)))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::Validation(format!("Invalid form field: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_options_default_is_cacheable() {
        let options: ImageOptions = serde_json::from_value(json!({})).unwrap();
        assert!(options.is_default());

        let options: ImageOptions = serde_json::from_value(json!({"seed": 42})).unwrap();
        assert!(!options.is_default());
    }

    #[test]
    fn test_image_options_serialize_skips_unset_fields() {
        let options: ImageOptions =
            serde_json::from_value(json!({"seed": 42, "aspect_ratio": "16:9"})).unwrap();
        let bag = serde_json::to_value(&options).unwrap();
        assert_eq!(bag, json!({"seed": 42, "aspect_ratio": "16:9"}));
    }

    #[test]
    fn test_image_options_reject_unknown_aspect_ratio() {
        let result: std::result::Result<ImageOptions, _> =
            serde_json::from_value(json!({"aspect_ratio": "2:1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_image_options_seed_range() {
        let options: ImageOptions = serde_json::from_value(json!({"seed": 0})).unwrap();
        assert!(options.validate().is_err());

        let options: ImageOptions =
            serde_json::from_value(json!({"seed": 2_147_483_647i64})).unwrap();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_image_options_guidance_scale_range() {
        let options: ImageOptions =
            serde_json::from_value(json!({"guidance_scale": 100.5})).unwrap();
        assert!(options.validate().is_err());

        let options: ImageOptions = serde_json::from_value(json!({"guidance_scale": 0.0})).unwrap();
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_seed_with_watermark_rejected() {
        let options: ImageOptions =
            serde_json::from_value(json!({"seed": 42, "add_watermark": true})).unwrap();
        assert!(options.check().is_err());

        // Seed alone is fine; an explicit false is fine
        let options: ImageOptions = serde_json::from_value(json!({"seed": 42})).unwrap();
        assert!(options.check().is_ok());
        let options: ImageOptions =
            serde_json::from_value(json!({"seed": 42, "add_watermark": false})).unwrap();
        assert!(options.check().is_ok());
    }

    #[test]
    fn test_video_duration_membership() {
        for duration in [4u8, 6, 8] {
            let options: VideoOptions =
                serde_json::from_value(json!({"duration_seconds": duration})).unwrap();
            assert!(options.check().is_ok());
        }
        let options: VideoOptions =
            serde_json::from_value(json!({"duration_seconds": 5})).unwrap();
        assert!(options.check().is_err());
    }

    #[test]
    fn test_video_options_reject_unknown_resolution() {
        let result: std::result::Result<VideoOptions, _> =
            serde_json::from_value(json!({"resolution": "480p"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_request_flattens_options() {
        let req: ImageGenerationRequest = serde_json::from_value(json!({
            "prompt": "A Sword",
            "model": "imagen-3.0-fast-generate-001",
            "seed": 42,
        }))
        .unwrap();
        assert_eq!(req.prompt, "A Sword");
        assert_eq!(req.options.seed, Some(42));
        assert!(!req.options.is_default());
    }

    #[test]
    fn test_snapshot_serializes_null_fields() {
        let snapshot = JobStatusResponse {
            job_id: Uuid::nil(),
            status: LiveStatus::Pending,
            asset_id: None,
            result_url: None,
            error_message: None,
        };
        let frame = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(frame["status"], "pending");
        assert!(frame["asset_id"].is_null());
        assert!(frame["error_message"].is_null());
    }
}
