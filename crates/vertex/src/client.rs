//! Vertex AI REST client
//!
//! Image generation goes through the synchronous `:predict` endpoint with
//! retry/backoff around the whole call. Video generation uses the LRO
//! protocol: `:predictLongRunning` returns an operation name, which is then
//! polled via `:fetchPredictOperation` until `done:true` or timeout.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};

use crate::extract::extract_media_bytes;
use crate::gcp_auth::GcpTokenProvider;
use crate::permits::GenerationPermits;
use crate::safety::{is_safety_message, SAFETY_MESSAGE};
use crate::{GenerationBackend, GenerationError, ReferenceImage};

/// Image endpoint retry budget
const IMAGE_MAX_ATTEMPTS: u32 = 5;
/// Video start-call retry budget
const VIDEO_START_MAX_ATTEMPTS: u32 = 3;
/// Seconds between LRO polls
const LRO_POLL_INTERVAL_SECS: u64 = 10;
/// Wall-clock budget for the whole LRO
const LRO_MAX_WAIT_SECS: u64 = 600;

/// Backoff before image retry `attempt` (1-based): min(60, 2·2^(n−1)), ≥ 2s
fn image_backoff_secs(attempt: u32) -> u64 {
    let wait = 2u64.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(32));
    wait.clamp(2, 60)
}

/// Backoff before video start retry `attempt` (1-based): min(30, 2·2^n), ≥ 5s
fn video_start_backoff_secs(attempt: u32) -> u64 {
    let wait = 2u64.saturating_mul(1u64 << attempt.min(32));
    wait.clamp(5, 30)
}

/// Classify a provider error message by substring.
///
/// The SDK folds HTTP status and gRPC status names into the message text,
/// so both are probed.
fn classify_error(message: &str) -> GenerationError {
    let retryable_markers = [
        "429",
        "RESOURCE_EXHAUSTED",
        "503",
        "UNAVAILABLE",
        "500",
        "INTERNAL",
    ];
    if retryable_markers.iter().any(|m| message.contains(m)) {
        return GenerationError::Retryable(message.to_string());
    }
    if is_safety_message(message) {
        return GenerationError::Safety(SAFETY_MESSAGE.to_string());
    }
    GenerationError::Remote(message.to_string())
}

/// Real Vertex AI generation backend
pub struct VertexAiBackend {
    http: reqwest::Client,
    tokens: GcpTokenProvider,
    models_base_url: String,
    permits: Arc<GenerationPermits>,
}

impl VertexAiBackend {
    pub fn new(
        project: &str,
        region: &str,
        credentials_path: Option<&str>,
        permits: Arc<GenerationPermits>,
    ) -> Result<Self, GenerationError> {
        let credentials_path = credentials_path.ok_or_else(|| {
            GenerationError::Auth("GOOGLE_APPLICATION_CREDENTIALS is required".to_string())
        })?;
        let tokens = GcpTokenProvider::from_credentials_file(credentials_path)?;

        let models_base_url = format!(
            "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/google/models"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            tokens,
            models_base_url,
            permits,
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<(u16, Value), GenerationError> {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Remote(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Remote(format!("Failed to read response: {}", e)))?;
        let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok((status, value))
    }

    async fn image_predict(
        &self,
        prompt: &str,
        model: &str,
        options: &Value,
    ) -> Result<Vec<u8>, GenerationError> {
        let url = format!("{}/{}:predict", self.models_base_url, model);
        let body = json!({
            "instances": [{"prompt": prompt}],
            "parameters": image_parameters(options),
        });

        let (status, payload) = self.post_json(&url, &body).await?;
        if status != 200 {
            let message = format!("{} {}", status, compact(&payload));
            return Err(classify_error(&message));
        }
        extract_media_bytes(&payload)
    }

    /// Start the video LRO. HTTP 429 and ≥500 are retryable; any other
    /// non-200 is terminal. Success yields the opaque operation name.
    async fn start_video_operation(
        &self,
        prompt: &str,
        model: &str,
        reference_image: Option<&ReferenceImage>,
        options: &Value,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/{}:predictLongRunning", self.models_base_url, model);

        let mut instance = Map::new();
        instance.insert("prompt".to_string(), Value::String(prompt.to_string()));
        if let Some(image) = reference_image {
            instance.insert(
                "image".to_string(),
                json!({
                    "bytesBase64Encoded": STANDARD.encode(&image.bytes),
                    "mimeType": image.mime_type,
                }),
            );
        }
        let body = json!({
            "instances": [Value::Object(instance)],
            "parameters": video_parameters(options),
        });

        let mut attempt = 1;
        loop {
            let (status, payload) = self.post_json(&url, &body).await?;
            match status {
                200 => {
                    return payload
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            GenerationError::Remote(
                                "Start response carried no operation name".to_string(),
                            )
                        });
                }
                429 | 500.. => {
                    let message = format!("Server error {}: {}", status, compact(&payload));
                    if attempt >= VIDEO_START_MAX_ATTEMPTS {
                        return Err(GenerationError::Retryable(message));
                    }
                    let wait = video_start_backoff_secs(attempt);
                    tracing::warn!(
                        attempt,
                        wait_secs = wait,
                        error = %message,
                        "Video start failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                _ => {
                    let message = format!("Client error {}: {}", status, compact(&payload));
                    if is_safety_message(&message) {
                        return Err(GenerationError::Safety(SAFETY_MESSAGE.to_string()));
                    }
                    return Err(GenerationError::Remote(message));
                }
            }
        }
    }

    /// Poll the operation every 10s until `done:true`, or time out at 600s.
    async fn poll_video_operation(
        &self,
        model: &str,
        operation_name: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        let url = format!("{}/{}:fetchPredictOperation", self.models_base_url, model);
        let body = json!({"operationName": operation_name});
        let started = tokio::time::Instant::now();

        loop {
            if started.elapsed() >= Duration::from_secs(LRO_MAX_WAIT_SECS) {
                return Err(GenerationError::Timeout(LRO_MAX_WAIT_SECS));
            }
            tokio::time::sleep(Duration::from_secs(LRO_POLL_INTERVAL_SECS)).await;

            let (status, payload) = self.post_json(&url, &body).await?;
            if status != 200 {
                return Err(GenerationError::Remote(format!(
                    "Poll failed with {}: {}",
                    status,
                    compact(&payload)
                )));
            }

            // A completed operation carrying `error` is a terminal failure
            if let Some(error) = payload.get("error") {
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| compact(error));
                if is_safety_message(&message) {
                    return Err(GenerationError::Safety(SAFETY_MESSAGE.to_string()));
                }
                return Err(GenerationError::Remote(message));
            }

            if payload.get("done").and_then(Value::as_bool).unwrap_or(false) {
                let envelope = payload.get("response").unwrap_or(&payload);
                return extract_media_bytes(envelope);
            }

            tracing::debug!(operation = operation_name, "Video operation still running");
        }
    }
}

#[async_trait::async_trait]
impl GenerationBackend for VertexAiBackend {
    async fn generate_image(
        &self,
        prompt: &str,
        model: &str,
        options: &Value,
    ) -> Result<Vec<u8>, GenerationError> {
        // The permit is held across retries: the cap bounds concurrent
        // slots, not attempts.
        let _permit = self.permits.acquire_image().await;

        let mut attempt = 1;
        loop {
            match self.image_predict(prompt, model, options).await {
                Ok(bytes) => return Ok(bytes),
                Err(GenerationError::Retryable(message)) => {
                    if attempt >= IMAGE_MAX_ATTEMPTS {
                        return Err(GenerationError::Retryable(message));
                    }
                    let wait = image_backoff_secs(attempt);
                    tracing::warn!(
                        attempt,
                        wait_secs = wait,
                        error = %message,
                        "Image generation failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    async fn generate_video(
        &self,
        prompt: &str,
        model: &str,
        reference_image: Option<ReferenceImage>,
        options: &Value,
    ) -> Result<Vec<u8>, GenerationError> {
        let _permit = self.permits.acquire_video().await;

        let operation_name = self
            .start_video_operation(prompt, model, reference_image.as_ref(), options)
            .await?;
        tracing::info!(operation = %operation_name, "Video operation started");

        self.poll_video_operation(model, &operation_name).await
    }
}

/// Render a payload compactly for error messages
fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Translate the image option bag to Imagen `parameters`
fn image_parameters(options: &Value) -> Value {
    let mut params = Map::new();
    params.insert("sampleCount".to_string(), json!(1));

    copy_option(options, &mut params, "aspect_ratio", "aspectRatio");
    copy_option(options, &mut params, "negative_prompt", "negativePrompt");
    copy_option(options, &mut params, "seed", "seed");
    copy_option(options, &mut params, "guidance_scale", "guidanceScale");
    copy_option(options, &mut params, "safety_filter_level", "safetySetting");
    copy_option(options, &mut params, "add_watermark", "addWatermark");
    copy_option(options, &mut params, "language", "language");

    Value::Object(params)
}

/// Translate the video option bag to Veo `parameters`
fn video_parameters(options: &Value) -> Value {
    let mut params = Map::new();
    params.insert("sampleCount".to_string(), json!(1));
    params.insert(
        "durationSeconds".to_string(),
        options.get("duration_seconds").cloned().unwrap_or(json!(8)),
    );
    params.insert(
        "aspectRatio".to_string(),
        options.get("aspect_ratio").cloned().unwrap_or(json!("16:9")),
    );

    copy_option(options, &mut params, "negative_prompt", "negativePrompt");
    copy_option(options, &mut params, "seed", "seed");
    copy_option(options, &mut params, "generate_audio", "generateAudio");
    copy_option(options, &mut params, "resolution", "resolution");

    Value::Object(params)
}

fn copy_option(options: &Value, params: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = options.get(from) {
        if !value.is_null() {
            params.insert(to.to_string(), value.clone());
        }
    }
}
