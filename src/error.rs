//! Error taxonomy for the tone analysis pipeline.
//!
//! Every variant is local and recoverable: the pipeline driver turns each
//! one into a `Failure` session transition with a short user-facing message.
//! Nothing here is ever retried automatically.

use thiserror::Error;

/// Coarse classification of an [`AnalysisError`], stable for tests and UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Ocr,
    EmptyInput,
    Transport,
    Unreachable,
    MalformedEnvelope,
    NotJson,
    SchemaMismatch,
    Cancelled,
}

/// Any failure raised by one of the pipeline stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The image could not be read or recognition produced nothing usable.
    #[error("OCR failed: {0}")]
    OcrFailure(String),

    /// Blocked action: the canonical text would be empty.
    #[error("Nothing to analyze: input is empty")]
    EmptyInput,

    /// The LLM endpoint answered with a non-success HTTP status.
    #[error("LLM endpoint returned HTTP {status}")]
    TransportFailure { status: u16 },

    /// The request never produced an HTTP status (DNS, TLS, connection reset).
    #[error("LLM endpoint unreachable: {0}")]
    Unreachable(String),

    /// 2xx response whose body is not the documented candidates envelope.
    #[error("Malformed LLM response envelope: {0}")]
    MalformedEnvelope(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The run was dropped before it reached a result (timeout, abort).
    #[error("Analysis was cancelled before it finished")]
    Cancelled,
}

/// Failures of the analysis payload carried inside a valid envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Analysis payload is not JSON: {0}")]
    NotJson(String),

    #[error("Analysis payload field '{field}' is invalid: {reason}")]
    SchemaMismatch { field: String, reason: String },
}

impl ParseError {
    pub(crate) fn mismatch(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::SchemaMismatch {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::OcrFailure(_) => ErrorKind::Ocr,
            AnalysisError::EmptyInput => ErrorKind::EmptyInput,
            AnalysisError::TransportFailure { .. } => ErrorKind::Transport,
            AnalysisError::Unreachable(_) => ErrorKind::Unreachable,
            AnalysisError::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            AnalysisError::Parse(ParseError::NotJson(_)) => ErrorKind::NotJson,
            AnalysisError::Parse(ParseError::SchemaMismatch { .. }) => ErrorKind::SchemaMismatch,
            AnalysisError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Short message for the presentation layer. One wording per kind.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::OcrFailure(_) => {
                "Failed to read image. Try pasting text manually.".to_string()
            }
            AnalysisError::EmptyInput => "Paste or type some text first.".to_string(),
            AnalysisError::TransportFailure { status } => format!(
                "Gemini rejected the request (HTTP {}). Check your API key.",
                status
            ),
            AnalysisError::Unreachable(_) => {
                "Couldn't reach Gemini. Check your connection.".to_string()
            }
            AnalysisError::MalformedEnvelope(_) => {
                "Gemini sent back an unexpected response. Try again.".to_string()
            }
            AnalysisError::Parse(ParseError::NotJson(_)) => {
                "Gemini had a brain freeze: the analysis wasn't valid JSON.".to_string()
            }
            AnalysisError::Parse(ParseError::SchemaMismatch { field, .. }) => format!(
                "Gemini's analysis was incomplete (bad '{}' field).",
                field
            ),
            AnalysisError::Cancelled => "Analysis was interrupted. Submit again.".to_string(),
        }
    }
}
