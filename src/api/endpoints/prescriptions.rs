//! Prescription endpoints: submit an analysis, list records, fetch one.
//!
//! `POST /api/prescriptions/analyze` is the whole product: decode the
//! payload, write the placeholder row, run the analysis pipeline, write the
//! merged result back, return it. Each submission without `prescription_id`
//! creates a new record — repeated submission of the same image is
//! deliberately not deduplicated.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{AnalysisError, AnalysisInput};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};
use crate::db::repository::prescription::{
    get_prescription_for_user, insert_prescription, list_prescriptions_for_user,
    mark_prescription_failed, update_prescription_analysis,
};
use crate::models::{AnalysisStatus, MedicationAnalysis, PrescriptionRecord};
use crate::vision::EncodedImage;

/// Record count returned by the list endpoint.
const LIST_LIMIT: u32 = 50;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 data URL or bare base64 of the prescription photo.
    #[serde(default, alias = "imageBase64")]
    pub image_base64: Option<String>,
    /// Pre-extracted prescription text, for clients that ran OCR themselves.
    #[serde(default, alias = "extractedText")]
    pub extracted_text: Option<String>,
    /// Existing pending record to update instead of creating a new one.
    #[serde(default, alias = "prescriptionId")]
    pub prescription_id: Option<Uuid>,
    /// Free-text caption stored on the record.
    #[serde(default)]
    pub describe: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub prescription_id: String,
    pub status: AnalysisStatus,
    #[serde(flatten)]
    pub analysis: MedicationAnalysis,
}

/// `POST /api/prescriptions/analyze`
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let input = build_input(&payload).map_err(ApiError::from)?;

    // Resolve the record first so the row exists (pending) while the
    // analysis is in flight, exactly one per submission.
    let record_id = match payload.prescription_id {
        Some(id) => {
            let existing = ctx.with_db(|conn| {
                Ok(get_prescription_for_user(conn, &id, &user.user_id)?)
            })?;
            let existing = existing
                .ok_or_else(|| ApiError::NotFound("Prescription not found".into()))?;
            existing.id
        }
        None => {
            let record = PrescriptionRecord::placeholder(user.user_id, payload.describe.clone());
            let id = record.id;
            ctx.with_db(|conn| Ok(insert_prescription(conn, &record)?))?;
            id
        }
    };

    tracing::info!(
        prescription_id = %record_id,
        user_id = %user.user_id,
        "Starting prescription analysis"
    );

    match ctx.analyzer.analyze(&input).await {
        Ok(analysis) => {
            ctx.with_db(|conn| Ok(update_prescription_analysis(conn, &record_id, &analysis)?))?;
            tracing::info!(prescription_id = %record_id, "Analysis complete and record updated");
            Ok(Json(AnalyzeResponse {
                prescription_id: record_id.to_string(),
                status: AnalysisStatus::Complete,
                analysis,
            }))
        }
        Err(e) => {
            // The row must not stay in the analyzing placeholder state.
            if let Err(mark_err) =
                ctx.with_db(|conn| Ok(mark_prescription_failed(conn, &record_id)?))
            {
                tracing::warn!(
                    prescription_id = %record_id,
                    error = %mark_err,
                    "Failed to mark prescription as failed"
                );
            }
            Err(e.into())
        }
    }
}

/// Turn the request payload into an analysis input: exactly one of image or
/// text must be present.
fn build_input(payload: &AnalyzeRequest) -> Result<AnalysisInput, AnalysisError> {
    let image = payload
        .image_base64
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let text = payload
        .extracted_text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (image, text) {
        (Some(_), Some(_)) => Err(AnalysisError::AmbiguousPayload),
        (Some(data_url), None) => Ok(AnalysisInput::Image(EncodedImage::from_data_url(data_url)?)),
        (None, Some(text)) => Ok(AnalysisInput::Text(text.to_string())),
        (None, None) => Err(AnalysisError::EmptyPayload),
    }
}

#[derive(Serialize)]
pub struct PrescriptionListResponse {
    pub prescriptions: Vec<PrescriptionRecord>,
}

/// `GET /api/prescriptions`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<PrescriptionListResponse>, ApiError> {
    let prescriptions =
        ctx.with_db(|conn| Ok(list_prescriptions_for_user(conn, &user.user_id, LIST_LIMIT)?))?;
    Ok(Json(PrescriptionListResponse { prescriptions }))
}

/// `GET /api/prescriptions/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<PrescriptionRecord>, ApiError> {
    let record = ctx
        .with_db(|conn| Ok(get_prescription_for_user(conn, &id, &user.user_id)?))?
        .ok_or_else(|| ApiError::NotFound("Prescription not found".into()))?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn request(
        image: Option<&str>,
        text: Option<&str>,
    ) -> AnalyzeRequest {
        AnalyzeRequest {
            image_base64: image.map(String::from),
            extracted_text: text.map(String::from),
            prescription_id: None,
            describe: None,
        }
    }

    fn jpeg_data_url() -> String {
        let bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    #[test]
    fn build_input_from_image() {
        let url = jpeg_data_url();
        let input = build_input(&request(Some(&url), None)).unwrap();
        assert!(matches!(input, AnalysisInput::Image(_)));
    }

    #[test]
    fn build_input_from_text() {
        let input = build_input(&request(None, Some("Amoxicillin 500mg"))).unwrap();
        assert!(matches!(input, AnalysisInput::Text(_)));
    }

    #[test]
    fn empty_payload_rejected() {
        assert!(matches!(
            build_input(&request(None, None)),
            Err(AnalysisError::EmptyPayload)
        ));
        // Whitespace-only counts as empty
        assert!(matches!(
            build_input(&request(Some("  "), None)),
            Err(AnalysisError::EmptyPayload)
        ));
    }

    #[test]
    fn both_fields_rejected() {
        let url = jpeg_data_url();
        assert!(matches!(
            build_input(&request(Some(&url), Some("text"))),
            Err(AnalysisError::AmbiguousPayload)
        ));
    }

    #[test]
    fn invalid_image_rejected() {
        assert!(matches!(
            build_input(&request(Some("data:image/jpeg;base64,???"), None)),
            Err(AnalysisError::InvalidImage(_))
        ));
    }

    #[test]
    fn camel_case_aliases_accepted() {
        let json = format!(
            r#"{{"imageBase64": "{}", "prescriptionId": "550e8400-e29b-41d4-a716-446655440000"}}"#,
            jpeg_data_url()
        );
        let payload: AnalyzeRequest = serde_json::from_str(&json).unwrap();
        assert!(payload.image_base64.is_some());
        assert!(payload.prescription_id.is_some());
    }
}
