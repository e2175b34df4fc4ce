//! Error types for the workflow.

use thiserror::Error;

/// Result type alias for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur while running a huddle.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Input text is empty. Please provide a valid prompt.")]
    EmptyInput,

    #[error("Chat error: {0}")]
    Chat(#[from] huddle_chat::ChatError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Could not open browser: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
