//! Client for the Gemini `generateContent` wire format.
//!
//! One POST per analysis: the extraction prompt plus (optionally) the image
//! as an inline base64 part. The reply's first candidate text is returned
//! verbatim for the analysis layer to parse.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{EncodedImage, VisionModelClient};
use super::VisionError;

/// Sampling temperature: extraction wants determinism, not creativity.
const TEMPERATURE: f32 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 60;

pub struct GeminiVisionClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiVisionClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
        }
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, VisionError> {
        let api_key = self.api_key.as_deref().ok_or(VisionError::ApiKeyMissing)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    VisionError::Unavailable(e.to_string())
                } else {
                    VisionError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::from_upstream(status.as_u16(), &body));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| VisionError::MalformedEnvelope(e.to_string()))?;

        extract_reply_text(&envelope)
    }
}

#[async_trait]
impl VisionModelClient for GeminiVisionClient {
    async fn analyze_image(
        &self,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<String, VisionError> {
        let start = std::time::Instant::now();
        let result = self
            .generate(vec![
                Part::text(prompt),
                Part::inline_image(image.mime_type, &image.base64_data),
            ])
            .await;
        tracing::info!(
            model = %self.model,
            mime = image.mime_type,
            elapsed_ms = %start.elapsed().as_millis(),
            ok = result.is_ok(),
            "Vision image call finished"
        );
        result
    }

    async fn analyze_text(&self, prompt: &str) -> Result<String, VisionError> {
        let start = std::time::Instant::now();
        let result = self.generate(vec![Part::text(prompt)]).await;
        tracing::info!(
            model = %self.model,
            elapsed_ms = %start.elapsed().as_millis(),
            ok = result.is_ok(),
            "Vision text call finished"
        );
        result
    }
}

// ── Wire format ──

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn inline_image(mime_type: &str, data: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the first text part out of the reply envelope.
fn extract_reply_text(envelope: &GenerateContentResponse) -> Result<String, VisionError> {
    envelope
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|content| content.parts.iter().find_map(|p| p.text.clone()))
        .ok_or_else(|| VisionError::MalformedEnvelope("no text candidate in response".into()))
}

// ── MockVisionClient (testing) ──

/// Mock vision client — returns configured replies or errors in sequence.
pub struct MockVisionClient {
    replies: std::sync::Mutex<Vec<Result<String, VisionError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockVisionClient {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            replies: std::sync::Mutex::new(vec![Ok(reply.to_string())]),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn with_error(error: VisionError) -> Self {
        Self {
            replies: std::sync::Mutex::new(vec![Err(error)]),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Queue responses consumed one per call; the last entry repeats.
    pub fn with_sequence(sequence: Vec<Result<String, VisionError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(sequence),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn next(&self) -> Result<String, VisionError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut replies = self.replies.lock().expect("mock replies lock");
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            clone_result(&replies[0])
        }
    }
}

fn clone_result(result: &Result<String, VisionError>) -> Result<String, VisionError> {
    match result {
        Ok(s) => Ok(s.clone()),
        Err(VisionError::ApiKeyMissing) => Err(VisionError::ApiKeyMissing),
        Err(VisionError::ApiKeyRejected) => Err(VisionError::ApiKeyRejected),
        Err(VisionError::QuotaExhausted(m)) => Err(VisionError::QuotaExhausted(m.clone())),
        Err(VisionError::Unavailable(m)) => Err(VisionError::Unavailable(m.clone())),
        Err(VisionError::Http(m)) => Err(VisionError::Http(m.clone())),
        Err(VisionError::MalformedEnvelope(m)) => Err(VisionError::MalformedEnvelope(m.clone())),
    }
}

#[async_trait]
impl VisionModelClient for MockVisionClient {
    async fn analyze_image(
        &self,
        _image: &EncodedImage,
        _prompt: &str,
    ) -> Result<String, VisionError> {
        self.next()
    }

    async fn analyze_text(&self, _prompt: &str) -> Result<String, VisionError> {
        self.next()
    }
}
