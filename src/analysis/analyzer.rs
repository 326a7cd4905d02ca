//! Analysis pipeline: vision call (with backoff) → parse → FDA lookup → merge.

use std::sync::Arc;
use std::time::Duration;

use crate::druginfo::{DrugInfo, DrugInfoClient};
use crate::models::MedicationAnalysis;
use crate::vision::{EncodedImage, VisionModelClient};

use super::merge::merge_drug_info;
use super::parser::parse_model_reply;
use super::prompt::{build_image_prompt, build_text_prompt};
use super::AnalysisError;

/// Retries for the vision call (the only retried call in the pipeline).
const MAX_VISION_RETRIES: usize = 2;

/// Base delay for exponential backoff between vision retries.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// What the client submitted: an image, or text it already extracted.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Image(EncodedImage),
    Text(String),
}

pub struct PrescriptionAnalyzer {
    vision: Arc<dyn VisionModelClient>,
    drug_info: Arc<dyn DrugInfoClient>,
}

impl PrescriptionAnalyzer {
    pub fn new(vision: Arc<dyn VisionModelClient>, drug_info: Arc<dyn DrugInfoClient>) -> Self {
        Self { vision, drug_info }
    }

    /// Run the full pipeline for one submission.
    pub async fn analyze(&self, input: &AnalysisInput) -> Result<MedicationAnalysis, AnalysisError> {
        let reply = self.call_vision_with_backoff(input).await?;

        let extraction = parse_model_reply(&reply)?;
        tracing::info!(
            medication = %extraction.medication_name,
            medication_en = extraction.medication_name_en.as_deref().unwrap_or(""),
            "Vision extraction parsed"
        );

        // FDA enrichment is keyed by the English name and never fails the
        // analysis; without a name there is nothing to look up.
        let info = match &extraction.medication_name_en {
            Some(name) => self.drug_info.lookup(name).await,
            None => {
                tracing::debug!("No English medication name extracted, skipping FDA lookup");
                DrugInfo::default()
            }
        };
        if info.is_empty() {
            tracing::debug!("No FDA data to merge");
        }

        Ok(merge_drug_info(extraction, &info))
    }

    /// Call the vision model, retrying transient failures with exponential
    /// backoff. Non-retryable errors (key configuration, malformed envelope)
    /// propagate immediately.
    async fn call_vision_with_backoff(
        &self,
        input: &AnalysisInput,
    ) -> Result<String, AnalysisError> {
        let mut attempt = 0;
        loop {
            let result = match input {
                AnalysisInput::Image(image) => {
                    self.vision.analyze_image(image, &build_image_prompt()).await
                }
                AnalysisInput::Text(text) => {
                    self.vision.analyze_text(&build_text_prompt(text)).await
                }
            };

            match result {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < MAX_VISION_RETRIES => {
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Vision call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parser::FIELD_PLACEHOLDER;
    use crate::druginfo::{DrugLabel, MockDrugInfoClient};
    use crate::vision::{MockVisionClient, VisionError};

    const GOOD_REPLY: &str = r#"{
        "raw_text": "أموكسيسيلين ٥٠٠ ملغ",
        "medication_name_ar": "أموكسيسيلين",
        "medication_name_en": "Amoxicillin",
        "dosage": "500mg",
        "frequency": "مرتين يومياً",
        "instructions": "بعد الطعام",
        "side_effects": "غثيان",
        "contraindications": "حساسية البنسلين",
        "medical_notes": "أكمل الجرعة"
    }"#;

    fn analyzer_with(vision: MockVisionClient, drug_info: MockDrugInfoClient) -> PrescriptionAnalyzer {
        PrescriptionAnalyzer::new(Arc::new(vision), Arc::new(drug_info))
    }

    fn text_input() -> AnalysisInput {
        AnalysisInput::Text("Amoxicillin 500mg".into())
    }

    #[tokio::test]
    async fn successful_analysis_returns_merged_fields() {
        let drug_info = MockDrugInfoClient::with_info(crate::druginfo::DrugInfo {
            label: Some(DrugLabel {
                warnings_and_cautions: vec!["Take with food.".into()],
                warnings: vec![],
                dosage_and_administration: vec![],
            }),
            events: None,
        });
        let analyzer = analyzer_with(MockVisionClient::with_reply(GOOD_REPLY), drug_info);

        let analysis = analyzer.analyze(&text_input()).await.unwrap();
        assert_eq!(analysis.medication_name, "أموكسيسيلين");
        assert_eq!(analysis.dosage, "500mg");
        assert!(analysis.medical_notes.contains("FDA Information:"));
    }

    #[tokio::test]
    async fn omitted_fields_become_placeholders() {
        let reply = r#"{"medication_name_ar": "دواء"}"#;
        let analyzer = analyzer_with(
            MockVisionClient::with_reply(reply),
            MockDrugInfoClient::empty(),
        );

        let analysis = analyzer.analyze(&text_input()).await.unwrap();
        assert_eq!(analysis.dosage, FIELD_PLACEHOLDER);
        assert_eq!(analysis.frequency, FIELD_PLACEHOLDER);
        assert_eq!(analysis.side_effects, FIELD_PLACEHOLDER);
        assert!(analysis.medication_name_en.is_none());
    }

    #[tokio::test]
    async fn non_json_reply_is_caught_parse_error() {
        let analyzer = analyzer_with(
            MockVisionClient::with_reply("لا يمكن قراءة الصورة"),
            MockDrugInfoClient::empty(),
        );

        let result = analyzer.analyze(&text_input()).await;
        match result {
            Err(e) => assert!(e.is_parse_failure()),
            Ok(_) => panic!("expected parse failure"),
        }
    }

    #[tokio::test]
    async fn transient_failure_is_retried_then_succeeds() {
        let vision = MockVisionClient::with_sequence(vec![
            Err(VisionError::Unavailable("overloaded".into())),
            Err(VisionError::QuotaExhausted("throttled".into())),
            Ok(GOOD_REPLY.into()),
        ]);
        let analyzer = analyzer_with(vision, MockDrugInfoClient::empty());

        let analysis = analyzer.analyze(&text_input()).await.unwrap();
        assert_eq!(analysis.dosage, "500mg");
    }

    #[tokio::test]
    async fn retries_are_exhausted_after_max_attempts() {
        let vision = MockVisionClient::with_error(VisionError::Unavailable("down".into()));
        let analyzer = PrescriptionAnalyzer::new(
            Arc::new(vision),
            Arc::new(MockDrugInfoClient::empty()),
        );

        let result = analyzer.analyze(&text_input()).await;
        assert!(matches!(
            result,
            Err(AnalysisError::Vision(VisionError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn key_errors_are_not_retried() {
        let vision = Arc::new(MockVisionClient::with_error(VisionError::ApiKeyRejected));
        let analyzer = PrescriptionAnalyzer::new(
            vision.clone(),
            Arc::new(MockDrugInfoClient::empty()),
        );

        let result = analyzer.analyze(&text_input()).await;
        assert!(matches!(
            result,
            Err(AnalysisError::Vision(VisionError::ApiKeyRejected))
        ));
        assert_eq!(vision.call_count(), 1);
    }

    #[tokio::test]
    async fn retry_count_is_bounded() {
        let vision = Arc::new(MockVisionClient::with_error(VisionError::Unavailable(
            "down".into(),
        )));
        let analyzer = PrescriptionAnalyzer::new(
            vision.clone(),
            Arc::new(MockDrugInfoClient::empty()),
        );

        let _ = analyzer.analyze(&text_input()).await;
        // 1 initial + MAX_VISION_RETRIES
        assert_eq!(vision.call_count(), 1 + MAX_VISION_RETRIES);
    }
}
