//! Error types for the chat system.

use std::fmt;
use std::path::PathBuf;

/// Chat system errors
#[derive(Debug)]
pub enum ChatError {
    /// A persona instruction file could not be read
    PromptNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Group chat created without any persona
    NoPersonas,
    /// The group chat already reached its termination condition
    ChatComplete,
    /// LLM is not configured
    LlmNotConfigured,
    /// LLM request failed
    LlmError(String),
    /// File system error
    IoError(std::io::Error),
    /// Serialization error
    SerializationError(String),
    /// Transcript not found
    SessionNotFound(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PromptNotFound { path, source } => write!(
                f,
                "Persona instructions not readable at {}: {}",
                path.display(),
                source
            ),
            Self::NoPersonas => write!(f, "Group chat needs at least one persona"),
            Self::ChatComplete => write!(f, "Chat is already complete"),
            Self::LlmNotConfigured => write!(
                f,
                "LLM not configured. Set AZURE_OPENAI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY"
            ),
            Self::LlmError(msg) => write!(f, "LLM error: {}", msg),
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::SessionNotFound(id) => write!(f, "Chat session not found: {}", id),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PromptNotFound { source, .. } => Some(source),
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;
