//! When a failed caption attempt is worth repeating, and how long to wait.
//!
//! Caption backends fail transiently in a few recognizable ways: the Hugging
//! Face inference API answers 503 while a cold model loads, hosted APIs
//! throttle with 429, and a local Ollama daemon may not be listening yet.
//! Bad credentials, an unknown model or an image the backend refuses fail the
//! same way on every attempt and are surfaced immediately.

use crate::error::CaptionError;
use std::time::Duration;

const MAX_BACKOFF_MS: u64 = 30_000;

/// Lower-cased fragments of transport errors that carry no HTTP status.
const TRANSIENT_HINTS: &[&str] = &["timed out", "connect", "currently loading"];

/// Whether another attempt could plausibly produce a caption.
pub fn is_retryable(error: &CaptionError) -> bool {
    match error {
        CaptionError::Timeout { .. } => true,
        CaptionError::Inference {
            status_code: Some(code),
            ..
        } => is_transient_status(*code),
        CaptionError::Inference {
            status_code: None,
            message,
        } => {
            let message = message.to_ascii_lowercase();
            TRANSIENT_HINTS.iter().any(|hint| message.contains(hint))
        }
        _ => false,
    }
}

fn is_transient_status(code: u16) -> bool {
    matches!(code, 408 | 429) || (500..=599).contains(&code)
}

/// Wait before retry number `retry` (0-based): `base_delay_ms` doubled per
/// retry, capped at 30 seconds.
pub fn backoff_duration(retry: u32, base_delay_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
    Duration::from_millis(base_delay_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn http(code: u16, message: &str) -> CaptionError {
        CaptionError::Inference {
            message: message.to_string(),
            status_code: Some(code),
        }
    }

    fn transport(message: &str) -> CaptionError {
        CaptionError::Inference {
            message: message.to_string(),
            status_code: None,
        }
    }

    #[test]
    fn test_cold_model_retried() {
        assert!(is_retryable(&http(503, "Model Salesforce/blip is currently loading")));
        assert!(is_retryable(&transport("Model is Currently Loading")));
    }

    #[test]
    fn test_throttling_and_gateway_errors_retried() {
        assert!(is_retryable(&http(429, "rate limit reached for gpt-4o-mini")));
        assert!(is_retryable(&http(408, "request timeout")));
        assert!(is_retryable(&http(502, "bad gateway")));
    }

    #[test]
    fn test_attempt_timeout_retried() {
        let err = CaptionError::Timeout {
            stage: "caption".to_string(),
            timeout_ms: 60_000,
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_ollama_not_listening_retried() {
        assert!(is_retryable(&transport(
            "error sending request: tcp connect error: Connection refused"
        )));
    }

    #[test]
    fn test_client_errors_fail_fast() {
        assert!(!is_retryable(&http(401, "invalid api key")));
        assert!(!is_retryable(&http(404, "model 'llava' not found")));
        assert!(!is_retryable(&http(400, "image could not be decoded")));
    }

    #[test]
    fn test_rejected_upload_fails_fast() {
        let err = CaptionError::UnsupportedFormat {
            path: PathBuf::from("notes.txt"),
            format: "unknown".to_string(),
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_empty_caption_not_retried_on_wording() {
        // "500" in an unstructured message is not a status code
        assert!(!is_retryable(&transport("empty caption after 500 tokens")));
    }

    #[test]
    fn test_backoff_doubles_from_configured_base() {
        let waits: Vec<_> = (0..4).map(|retry| backoff_duration(retry, 250)).collect();
        assert_eq!(
            waits,
            [250, 500, 1000, 2000].map(Duration::from_millis)
        );
    }

    #[test]
    fn test_backoff_never_exceeds_cap() {
        assert_eq!(backoff_duration(7, 1000), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_duration(200, 1), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_duration(3, u64::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }
}
