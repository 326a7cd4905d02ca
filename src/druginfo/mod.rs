pub mod openfda;
pub mod types;

pub use openfda::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrugInfoError {
    #[error("drug API returned error (status {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("response parsing error: {0}")]
    ResponseParsing(String),
}
