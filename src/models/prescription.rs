use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AnalysisStatus;

/// Placeholder written into `raw_text` while the analysis is in flight.
/// "جاري التحليل..." = "analyzing...".
pub const ANALYZING_PLACEHOLDER: &str = "جاري التحليل...";

/// Default caption for a record created by the analyze endpoint.
pub const DEFAULT_DESCRIBE: &str = "تحليل الوصفة الطبية";

/// One user-submitted prescription image and its extracted medication fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub raw_text: String,
    pub describe: Option<String>,
    pub medication_name: String,
    pub medication_name_en: Option<String>,
    pub dosage: String,
    pub frequency: String,
    pub instructions: String,
    pub side_effects: String,
    pub contraindications: String,
    pub medical_notes: String,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrescriptionRecord {
    /// New pending record with placeholder values, as written before the
    /// analysis pipeline runs.
    pub fn placeholder(user_id: Uuid, describe: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            raw_text: ANALYZING_PLACEHOLDER.to_string(),
            describe: describe.or_else(|| Some(DEFAULT_DESCRIBE.to_string())),
            medication_name: String::new(),
            medication_name_en: None,
            dosage: String::new(),
            frequency: String::new(),
            instructions: String::new(),
            side_effects: String::new(),
            contraindications: String::new(),
            medical_notes: String::new(),
            status: AnalysisStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Merged medication fields produced by the analysis pipeline: the vision
/// model's extraction plus any appended openFDA sections. Written back onto
/// the prescription record in a single update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationAnalysis {
    pub raw_text: String,
    pub medication_name: String,
    pub medication_name_en: Option<String>,
    pub dosage: String,
    pub frequency: String,
    pub instructions: String,
    pub side_effects: String,
    pub contraindications: String,
    pub medical_notes: String,
}
