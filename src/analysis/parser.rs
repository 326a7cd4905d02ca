//! Parse the model's freeform reply into a typed extraction.
//!
//! Schema-checked deserialization with a per-field fallback, not regex
//! scraping: the reply is located via a three-step ladder (whole body →
//! fenced ```json block → first `{...}` span), deserialized into
//! `RawExtraction`, and every absent or blank field is substituted with the
//! localized "not available" placeholder.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use super::AnalysisError;

/// Localized placeholder for any field the model omitted. "غير متوفر" =
/// "not available".
pub const FIELD_PLACEHOLDER: &str = "غير متوفر";

/// The model's reply contract, everything optional. Unknown keys are
/// ignored; older prompt revisions used `medication_name` for the Arabic
/// name, hence the alias.
#[derive(Debug, Default, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default, alias = "medication_name")]
    pub medication_name_ar: Option<String>,
    #[serde(default)]
    pub medication_name_en: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub side_effects: Option<String>,
    #[serde(default)]
    pub contraindications: Option<String>,
    #[serde(default)]
    pub medical_notes: Option<String>,
}

/// A complete extraction with placeholders substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPrescription {
    pub raw_text: String,
    pub medication_name: String,
    /// `None` (not a placeholder) when absent — this field gates the openFDA
    /// lookup and a placeholder would be queried as a drug name.
    pub medication_name_en: Option<String>,
    pub dosage: String,
    pub frequency: String,
    pub instructions: String,
    pub side_effects: String,
    pub contraindications: String,
    pub medical_notes: String,
}

/// Parse a model reply into an extraction, or a typed error. Never panics.
pub fn parse_model_reply(reply: &str) -> Result<ExtractedPrescription, AnalysisError> {
    let json = locate_json_object(reply).ok_or(AnalysisError::NoJsonFound)?;
    let raw: RawExtraction =
        serde_json::from_str(&json).map_err(|e| AnalysisError::SchemaMismatch(e.to_string()))?;
    Ok(finalize(raw))
}

/// Find the JSON object inside the reply.
///
/// 1. The whole trimmed body, when the model obeyed the contract.
/// 2. The first ```json fenced block.
/// 3. The first-to-last brace span (the legacy scrape, kept as last resort).
fn locate_json_object(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed.to_string());
    }

    if let Some(start) = trimmed.find("```json") {
        let content_start = start + 7;
        if let Some(end) = trimmed[content_start..].find("```") {
            return Some(trimmed[content_start..content_start + end].trim().to_string());
        }
    }

    static BRACE_SPAN: OnceLock<Regex> = OnceLock::new();
    let re = BRACE_SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));
    re.find(trimmed).map(|m| m.as_str().to_string())
}

/// Substitute the localized placeholder for each absent or blank field.
fn finalize(raw: RawExtraction) -> ExtractedPrescription {
    ExtractedPrescription {
        raw_text: or_placeholder(raw.raw_text),
        medication_name: or_placeholder(raw.medication_name_ar),
        medication_name_en: raw
            .medication_name_en
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        dosage: or_placeholder(raw.dosage),
        frequency: or_placeholder(raw.frequency),
        instructions: or_placeholder(raw.instructions),
        side_effects: or_placeholder(raw.side_effects),
        contraindications: or_placeholder(raw.contraindications),
        medical_notes: or_placeholder(raw.medical_notes),
    }
}

fn or_placeholder(value: Option<String>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => FIELD_PLACEHOLDER.to_string(),
    }
}
