use async_trait::async_trait;
use serde::Deserialize;

/// Everything openFDA contributed for one medication name. Either half can
/// be absent — lookups degrade to `None` rather than failing the analysis.
#[derive(Debug, Clone, Default)]
pub struct DrugInfo {
    pub label: Option<DrugLabel>,
    pub events: Option<AdverseEventReport>,
}

impl DrugInfo {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.events.is_none()
    }
}

/// Structured regulatory label data (`/drug/label.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrugLabel {
    #[serde(default)]
    pub warnings_and_cautions: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub dosage_and_administration: Vec<String>,
}

impl DrugLabel {
    /// Warnings text: `warnings_and_cautions` with `warnings` as fallback,
    /// matching the label API's two generations of field names.
    pub fn warning_lines(&self) -> &[String] {
        if !self.warnings_and_cautions.is_empty() {
            &self.warnings_and_cautions
        } else {
            &self.warnings
        }
    }
}

/// One reported adverse-event case (`/drug/event.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdverseEventReport {
    pub patient: Option<EventPatient>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatient {
    #[serde(default)]
    pub reaction: Vec<EventReaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventReaction {
    /// MedDRA preferred term of the reaction.
    pub reactionmeddrapt: Option<String>,
}

impl AdverseEventReport {
    /// Comma-joined reaction terms, or `None` when the case carries none.
    pub fn reaction_summary(&self) -> Option<String> {
        let terms: Vec<&str> = self
            .patient
            .as_ref()?
            .reaction
            .iter()
            .filter_map(|r| r.reactionmeddrapt.as_deref())
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(terms.join(", "))
        }
    }
}

/// Drug-information lookup abstraction (allows mocking).
///
/// Infallible by contract: any upstream failure degrades to an empty
/// `DrugInfo`, because FDA enrichment is never allowed to fail an analysis.
#[async_trait]
pub trait DrugInfoClient: Send + Sync {
    async fn lookup(&self, drug_name: &str) -> DrugInfo;
}

/// Mock drug-info client for testing.
pub struct MockDrugInfoClient {
    info: DrugInfo,
}

impl MockDrugInfoClient {
    pub fn empty() -> Self {
        Self {
            info: DrugInfo::default(),
        }
    }

    pub fn with_info(info: DrugInfo) -> Self {
        Self { info }
    }
}

#[async_trait]
impl DrugInfoClient for MockDrugInfoClient {
    async fn lookup(&self, _drug_name: &str) -> DrugInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_lines_prefer_warnings_and_cautions() {
        let label = DrugLabel {
            warnings_and_cautions: vec!["new-style".into()],
            warnings: vec!["old-style".into()],
            dosage_and_administration: vec![],
        };
        assert_eq!(label.warning_lines(), ["new-style".to_string()]);
    }

    #[test]
    fn warning_lines_fall_back_to_warnings() {
        let label = DrugLabel {
            warnings_and_cautions: vec![],
            warnings: vec!["old-style".into()],
            dosage_and_administration: vec![],
        };
        assert_eq!(label.warning_lines(), ["old-style".to_string()]);
    }

    #[test]
    fn reaction_summary_joins_terms() {
        let report = AdverseEventReport {
            patient: Some(EventPatient {
                reaction: vec![
                    EventReaction {
                        reactionmeddrapt: Some("Nausea".into()),
                    },
                    EventReaction {
                        reactionmeddrapt: None,
                    },
                    EventReaction {
                        reactionmeddrapt: Some("Headache".into()),
                    },
                ],
            }),
        };
        assert_eq!(report.reaction_summary().unwrap(), "Nausea, Headache");
    }

    #[test]
    fn reaction_summary_none_when_no_terms() {
        assert!(AdverseEventReport::default().reaction_summary().is_none());
        let empty_patient = AdverseEventReport {
            patient: Some(EventPatient { reaction: vec![] }),
        };
        assert!(empty_patient.reaction_summary().is_none());
    }
}
