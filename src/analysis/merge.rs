//! Merge the vision extraction with openFDA data.
//!
//! Each FDA section is appended under its own heading, and only when the
//! source data is non-empty: label warnings onto `medical_notes`, label
//! dosage-and-administration onto `instructions`, reported reactions onto
//! `side_effects`.

use crate::druginfo::DrugInfo;
use crate::models::MedicationAnalysis;

use super::parser::ExtractedPrescription;

const FDA_INFO_HEADING: &str = "FDA Information:";
const FDA_DOSAGE_HEADING: &str = "FDA Dosage Information:";
const FDA_REACTIONS_HEADING: &str = "FDA Reported Side Effects:";

pub fn merge_drug_info(extraction: ExtractedPrescription, info: &DrugInfo) -> MedicationAnalysis {
    let mut analysis = MedicationAnalysis {
        raw_text: extraction.raw_text,
        medication_name: extraction.medication_name,
        medication_name_en: extraction.medication_name_en,
        dosage: extraction.dosage,
        frequency: extraction.frequency,
        instructions: extraction.instructions,
        side_effects: extraction.side_effects,
        contraindications: extraction.contraindications,
        medical_notes: extraction.medical_notes,
    };

    if let Some(label) = &info.label {
        let warnings = label.warning_lines();
        if !warnings.is_empty() {
            append_section(&mut analysis.medical_notes, FDA_INFO_HEADING, &warnings.join("\n"));
        }
        if !label.dosage_and_administration.is_empty() {
            append_section(
                &mut analysis.instructions,
                FDA_DOSAGE_HEADING,
                &label.dosage_and_administration.join("\n"),
            );
        }
    }

    if let Some(events) = &info.events {
        if let Some(reactions) = events.reaction_summary() {
            append_section(&mut analysis.side_effects, FDA_REACTIONS_HEADING, &reactions);
        }
    }

    analysis
}

fn append_section(field: &mut String, heading: &str, body: &str) {
    field.push_str("\n\n");
    field.push_str(heading);
    field.push('\n');
    field.push_str(body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::druginfo::{AdverseEventReport, DrugLabel, EventPatient, EventReaction};

    fn extraction() -> ExtractedPrescription {
        ExtractedPrescription {
            raw_text: "نص الوصفة".into(),
            medication_name: "أموكسيسيلين".into(),
            medication_name_en: Some("Amoxicillin".into()),
            dosage: "500mg".into(),
            frequency: "مرتين يومياً".into(),
            instructions: "يؤخذ بعد الطعام".into(),
            side_effects: "غثيان".into(),
            contraindications: "حساسية البنسلين".into(),
            medical_notes: "ملاحظات".into(),
        }
    }

    #[test]
    fn no_fda_data_leaves_fields_untouched() {
        let analysis = merge_drug_info(extraction(), &DrugInfo::default());
        assert_eq!(analysis.medical_notes, "ملاحظات");
        assert_eq!(analysis.instructions, "يؤخذ بعد الطعام");
        assert_eq!(analysis.side_effects, "غثيان");
    }

    #[test]
    fn label_warnings_append_to_medical_notes() {
        let info = DrugInfo {
            label: Some(DrugLabel {
                warnings_and_cautions: vec!["May cause drowsiness.".into(), "Avoid alcohol.".into()],
                warnings: vec![],
                dosage_and_administration: vec![],
            }),
            events: None,
        };
        let analysis = merge_drug_info(extraction(), &info);
        assert!(analysis.medical_notes.starts_with("ملاحظات"));
        assert!(analysis.medical_notes.contains("FDA Information:"));
        assert!(analysis.medical_notes.contains("May cause drowsiness.\nAvoid alcohol."));
        // Other fields untouched
        assert_eq!(analysis.instructions, "يؤخذ بعد الطعام");
    }

    #[test]
    fn legacy_warnings_field_is_used_as_fallback() {
        let info = DrugInfo {
            label: Some(DrugLabel {
                warnings_and_cautions: vec![],
                warnings: vec!["Old-style warning.".into()],
                dosage_and_administration: vec![],
            }),
            events: None,
        };
        let analysis = merge_drug_info(extraction(), &info);
        assert!(analysis.medical_notes.contains("Old-style warning."));
    }

    #[test]
    fn dosage_lines_append_to_instructions() {
        let info = DrugInfo {
            label: Some(DrugLabel {
                warnings_and_cautions: vec![],
                warnings: vec![],
                dosage_and_administration: vec!["One tablet every 12 hours.".into()],
            }),
            events: None,
        };
        let analysis = merge_drug_info(extraction(), &info);
        assert!(analysis.instructions.contains("FDA Dosage Information:"));
        assert!(analysis.instructions.contains("One tablet every 12 hours."));
        assert!(!analysis.medical_notes.contains("FDA Information:"));
    }

    #[test]
    fn reactions_append_to_side_effects() {
        let info = DrugInfo {
            label: None,
            events: Some(AdverseEventReport {
                patient: Some(EventPatient {
                    reaction: vec![
                        EventReaction {
                            reactionmeddrapt: Some("Nausea".into()),
                        },
                        EventReaction {
                            reactionmeddrapt: Some("Rash".into()),
                        },
                    ],
                }),
            }),
        };
        let analysis = merge_drug_info(extraction(), &info);
        assert!(analysis.side_effects.starts_with("غثيان"));
        assert!(analysis.side_effects.contains("FDA Reported Side Effects:\nNausea, Rash"));
    }

    #[test]
    fn empty_label_lists_append_nothing() {
        let info = DrugInfo {
            label: Some(DrugLabel::default()),
            events: Some(AdverseEventReport::default()),
        };
        let analysis = merge_drug_info(extraction(), &info);
        assert!(!analysis.medical_notes.contains("FDA"));
        assert!(!analysis.instructions.contains("FDA"));
        assert!(!analysis.side_effects.contains("FDA"));
    }
}
