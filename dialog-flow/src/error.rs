use thiserror::Error;

/// Errors raised while driving a calculator dialog.
#[derive(Error, Debug)]
pub enum FlowError {
    /// The answer to a step could not be understood. Recoverable: the step is asked again.
    #[error("Invalid input for step {step}")]
    ParseFailure { step: String },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unknown {kind}: {code}")]
    UnknownCategory { kind: String, code: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Calculator not found: {0}")]
    CalculatorNotFound(String),

    /// A language model or mail server could not be reached.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    pub fn parse_failure(step: impl Into<String>) -> Self {
        Self::ParseFailure { step: step.into() }
    }

    pub fn unknown_category(kind: impl Into<String>, code: impl Into<String>) -> Self {
        Self::UnknownCategory {
            kind: kind.into(),
            code: code.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
