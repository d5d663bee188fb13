//! Safety-policy error translation
//!
//! Vertex AI reports content refusals with inconsistent wording that leaks
//! internal vocabulary. Before a non-retryable error is raised, its text is
//! matched against a fixed pattern list; a hit replaces the raw message with
//! one fixed user-facing sentence.

/// The single sentence shown to users for any safety-policy refusal
pub const SAFETY_MESSAGE: &str =
    "The request was declined by the content safety policy. Please adjust the prompt and try again.";

/// Lowercased substrings that identify a safety-policy refusal
const SAFETY_PATTERNS: &[&str] = &[
    "usage guidelines",
    "could not be submitted",
    "raimediafiltered",
    "safety",
    "responsible ai",
    "copyright",
    "trademark",
    "person",
    "child",
    "blocked",
];

/// Check whether a raw provider error message is a safety refusal
pub fn is_safety_message(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    SAFETY_PATTERNS.iter().any(|p| lowered.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_safety_patterns_match() {
        assert!(is_safety_message(
            "The prompt could not be submitted. Review our usage guidelines."
        ));
        assert!(is_safety_message("raiMediaFiltered: person"));
        assert!(is_safety_message("Blocked by Responsible AI practices"));
        assert!(is_safety_message("possible TRADEMARK violation"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(is_safety_message("SAFETY system rejected the request"));
        assert!(is_safety_message("Depicts a CHILD"));
    }

    #[test]
    fn test_plain_errors_do_not_match() {
        assert!(!is_safety_message("Client error 400: invalid aspect ratio"));
        assert!(!is_safety_message("connection reset by peer"));
    }
}
