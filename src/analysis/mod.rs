pub mod analyzer;
pub mod merge;
pub mod parser;
pub mod prompt;

pub use analyzer::*;
pub use merge::*;
pub use parser::*;
pub use prompt::*;

use thiserror::Error;

use crate::vision::{ImageDecodeError, VisionError};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("vision analysis failed: {0}")]
    Vision(#[from] VisionError),

    #[error("no JSON object found in the model reply")]
    NoJsonFound,

    #[error("model reply JSON did not match the expected shape: {0}")]
    SchemaMismatch(String),

    #[error("empty payload: provide image_base64 or extracted_text")]
    EmptyPayload,

    #[error("ambiguous payload: provide image_base64 or extracted_text, not both")]
    AmbiguousPayload,

    #[error("invalid image payload: {0}")]
    InvalidImage(#[from] ImageDecodeError),
}

impl AnalysisError {
    /// Parse failures are caught and surfaced as a localized failure; they
    /// must never propagate as a panic.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            AnalysisError::NoJsonFound | AnalysisError::SchemaMismatch(_)
        )
    }
}
