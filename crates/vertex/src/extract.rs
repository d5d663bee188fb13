//! Response-payload extraction
//!
//! The generation endpoints moved the media bytes around between API
//! revisions, so the result envelope is probed at every known location.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::safety::SAFETY_MESSAGE;
use crate::GenerationError;

/// Probe the result envelope for base64 media bytes and decode the first hit.
///
/// Locations, in order:
/// 1. `predictions[0].bytesBase64Encoded`
/// 2. `predictions[0].video.bytesBase64Encoded`
/// 3. `videos[0].bytesBase64Encoded`
/// 4. `generatedSamples[0].video.bytesBase64Encoded`
/// 5. `video.bytesBase64Encoded`
///
/// A `raiMediaFilteredCount > 0`, or an envelope with none of the locations
/// populated, is a safety refusal carrying the first filtered reason.
pub fn extract_media_bytes(envelope: &Value) -> Result<Vec<u8>, GenerationError> {
    if filtered_count(envelope) > 0 {
        let reason = first_filtered_reason(envelope);
        tracing::warn!(reason = %reason, "Provider filtered the generated media");
        return Err(GenerationError::Safety(SAFETY_MESSAGE.to_string()));
    }

    let candidates = [
        envelope.pointer("/predictions/0/bytesBase64Encoded"),
        envelope.pointer("/predictions/0/video/bytesBase64Encoded"),
        envelope.pointer("/videos/0/bytesBase64Encoded"),
        envelope.pointer("/generatedSamples/0/video/bytesBase64Encoded"),
        envelope.pointer("/video/bytesBase64Encoded"),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Some(encoded) = candidate.as_str() {
            return STANDARD.decode(encoded).map_err(|e| {
                GenerationError::Remote(format!("Malformed media payload: {}", e))
            });
        }
    }

    tracing::warn!("Result envelope carried no media payload");
    Err(GenerationError::Safety(SAFETY_MESSAGE.to_string()))
}

fn filtered_count(envelope: &Value) -> u64 {
    envelope
        .get("raiMediaFilteredCount")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn first_filtered_reason(envelope: &Value) -> String {
    envelope
        .pointer("/raiMediaFilteredReasons/0")
        .and_then(Value::as_str)
        .unwrap_or("unspecified")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PIXEL: &str = "aGVsbG8="; // "hello"

    #[test]
    fn test_probe_order_first_location_wins() {
        let envelope = json!({
            "predictions": [{"bytesBase64Encoded": PIXEL}]
        });
        assert_eq!(extract_media_bytes(&envelope).unwrap(), b"hello");
    }

    #[test]
    fn test_probe_nested_video_locations() {
        let envelope = json!({
            "predictions": [{"video": {"bytesBase64Encoded": PIXEL}}]
        });
        assert_eq!(extract_media_bytes(&envelope).unwrap(), b"hello");

        let envelope = json!({
            "videos": [{"bytesBase64Encoded": PIXEL}]
        });
        assert_eq!(extract_media_bytes(&envelope).unwrap(), b"hello");

        let envelope = json!({
            "generatedSamples": [{"video": {"bytesBase64Encoded": PIXEL}}]
        });
        assert_eq!(extract_media_bytes(&envelope).unwrap(), b"hello");

        let envelope = json!({
            "video": {"bytesBase64Encoded": PIXEL}
        });
        assert_eq!(extract_media_bytes(&envelope).unwrap(), b"hello");
    }

    #[test]
    fn test_filtered_media_is_a_safety_error() {
        let envelope = json!({
            "raiMediaFilteredCount": 1,
            "raiMediaFilteredReasons": ["person"],
            "videos": [{"bytesBase64Encoded": PIXEL}]
        });
        let err = extract_media_bytes(&envelope).unwrap_err();
        match err {
            GenerationError::Safety(msg) => {
                assert_eq!(msg, SAFETY_MESSAGE);
                assert!(!msg.contains("raiMediaFiltered"));
            }
            other => panic!("expected safety error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_envelope_is_a_safety_error() {
        let envelope = json!({"predictions": []});
        assert!(matches!(
            extract_media_bytes(&envelope),
            Err(GenerationError::Safety(_))
        ));
    }

    #[test]
    fn test_invalid_base64_is_a_remote_error() {
        let envelope = json!({
            "predictions": [{"bytesBase64Encoded": "!!not base64!!"}]
        });
        assert!(matches!(
            extract_media_bytes(&envelope),
            Err(GenerationError::Remote(_))
        ));
    }
}
