use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a prescription record.
///
/// A record is created `Pending`, then transitions exactly once to
/// `Complete` or `Failed`. No other mutation happens afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Complete,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Complete => "complete",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "complete" => Ok(AnalysisStatus::Complete),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(other.to_string()),
        }
    }
}
