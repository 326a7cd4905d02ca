pub mod gemini;
pub mod types;

pub use gemini::*;
pub use types::*;

use thiserror::Error;

/// Typed failure taxonomy for the hosted vision API. Upstream failures are
/// classified once, at the client boundary, instead of by matching error
/// message substrings in the handler.
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("vision API key is not configured")]
    ApiKeyMissing,

    #[error("vision API rejected the configured key")]
    ApiKeyRejected,

    #[error("vision API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("vision API unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("malformed vision API response: {0}")]
    MalformedEnvelope(String),
}

impl VisionError {
    /// Classify a non-success upstream status + body into an error variant.
    ///
    /// Google reports quota exhaustion both as HTTP 429 and as a
    /// RESOURCE_EXHAUSTED status string inside other envelopes; some
    /// OpenAI-compatible gateways use "insufficient_quota".
    pub fn from_upstream(status: u16, body: &str) -> Self {
        if status == 401 || status == 403 {
            return VisionError::ApiKeyRejected;
        }
        if status == 429
            || body.contains("RESOURCE_EXHAUSTED")
            || body.contains("insufficient_quota")
        {
            return VisionError::QuotaExhausted(truncate(body));
        }
        if status >= 500 || body.contains("UNAVAILABLE") {
            return VisionError::Unavailable(format!("status {status}: {}", truncate(body)));
        }
        VisionError::Http(format!("status {status}: {}", truncate(body)))
    }

    /// Transient errors worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VisionError::QuotaExhausted(_) | VisionError::Unavailable(_) | VisionError::Http(_)
        )
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}
