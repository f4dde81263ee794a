//! Error types for AnimalMoji.

use thiserror::Error;

use crate::schema::SchemaViolation;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while staging, invoking or validating an analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// No image payload was supplied
    #[error("No photo data provided")]
    InputMissing,

    /// Selected file is not a supported image
    #[error("Unsupported file type: {0}")]
    InputTypeInvalid(String),

    /// Payload is not a well-formed image data URI
    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    /// Request failed the capability's input schema
    #[error("Invalid analysis request: {0}")]
    InputInvalid(SchemaViolation),

    /// Model produced no usable output
    #[error("Model output invalid: {0}")]
    ModelOutputInvalid(#[from] OutputDefect),

    /// Failure talking to the model provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// The session driver task is gone
    #[error("Session driver stopped")]
    SessionClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a model reply was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputDefect {
    /// The model returned nothing to parse
    #[error("the model did not return an output")]
    Missing,

    /// The reply does not contain a JSON object
    #[error("reply is not a JSON object: {0}")]
    Malformed(String),

    /// The reply's object does not satisfy the output schema
    #[error("{0}")]
    Schema(#[from] SchemaViolation),
}

impl OutputDefect {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            OutputDefect::Missing => "missing",
            OutputDefect::Malformed(_) => "malformed",
            OutputDefect::Schema(_) => "schema",
        }
    }
}
