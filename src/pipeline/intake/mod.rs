//! Intake Normalizer: free-text order → resolved order candidate.
//!
//! One extraction request per dispatcher message, bounded by the client
//! timeout, never retried. Anything other than a well-formed JSON answer
//! is a `NormalizationFailed`, and no order is created from it.

pub mod types;
pub mod prompt;
pub mod parser;
pub mod openrouter;
pub mod normalizer;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use openrouter::*;
pub use normalizer::*;

use thiserror::Error;

/// What the dispatcher is told when extraction fails.
pub const RESEND_PROMPT: &str = "Не удалось обработать сообщение. Попробуйте еще раз.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntakeError {
    #[error("Order text is empty")]
    EmptyInput,

    #[error("Could not normalize order text: {0}")]
    NormalizationFailed(#[from] FailureReason),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("extraction request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("extraction service unreachable: {0}")]
    Transport(String),

    #[error("extraction service returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),
}
