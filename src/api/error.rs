//! API error types with structured JSON responses.
//!
//! User-facing messages for the analysis failure modes are localized in
//! Arabic (the application's UI language); plumbing errors keep English
//! developer-facing messages. Internal detail is logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::db::DatabaseError;
use crate::vision::VisionError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Vision API key configuration error")]
    ApiKeyConfig,
    #[error("Upstream quota exhausted")]
    QuotaExhausted { retry_after: u64 },
    #[error("Upstream service unavailable")]
    UpstreamUnavailable,
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::ApiKeyConfig => (
                StatusCode::FORBIDDEN,
                "API_KEY_CONFIG",
                "خطأ في تكوين المفتاح API".to_string(),
            ),
            ApiError::QuotaExhausted { retry_after } => {
                tracing::warn!(retry_after, "Upstream quota exhausted");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "QUOTA_EXHAUSTED",
                    "تم تجاوز الحد المسموح. يرجى المحاولة لاحقاً".to_string(),
                )
            }
            ApiError::UpstreamUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPSTREAM_UNAVAILABLE",
                "النظام مشغول حالياً. يرجى المحاولة لاحقاً".to_string(),
            ),
            ApiError::AnalysisFailed(detail) => {
                tracing::error!(detail, "Prescription analysis failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ANALYSIS_FAILED",
                    "حدث خطأ أثناء تحليل الوصفة الطبية".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        // Add retry-after header for quota responses
        if let ApiError::QuotaExhausted { retry_after } = &self {
            if let Ok(val) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

impl From<VisionError> for ApiError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::ApiKeyMissing | VisionError::ApiKeyRejected => ApiError::ApiKeyConfig,
            VisionError::QuotaExhausted(_) => ApiError::QuotaExhausted { retry_after: 60 },
            VisionError::Unavailable(_) | VisionError::Http(_) => ApiError::UpstreamUnavailable,
            VisionError::MalformedEnvelope(detail) => ApiError::AnalysisFailed(detail),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Vision(e) => e.into(),
            AnalysisError::NoJsonFound | AnalysisError::SchemaMismatch(_) => {
                ApiError::AnalysisFailed(err.to_string())
            }
            AnalysisError::EmptyPayload | AnalysisError::AmbiguousPayload => {
                ApiError::BadRequest(err.to_string())
            }
            AnalysisError::InvalidImage(e) => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
