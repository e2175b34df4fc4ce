//! Core types for the persona group chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a chat session
pub type SessionId = String;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Assistant => "assistant",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique message ID (UUID)
    pub id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Persona name for assistant turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Message content
    pub content: String,
    /// When the message was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, author: Option<String>, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            author,
            content,
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, None, content.into())
    }

    /// Create a new assistant message without an author
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, None, content.into())
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, None, content.into())
    }

    /// Create an assistant message authored by a persona
    pub fn from_persona(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, Some(author.into()), content.into())
    }

    /// Whether the content contains `needle`, ignoring letter case
    pub fn mentions(&self, needle: &str) -> bool {
        contains_ignore_case(&self.content, needle)
    }

    /// Author name, or "Unknown" when the message has none
    pub fn author_or_unknown(&self) -> &str {
        self.author.as_deref().unwrap_or("Unknown")
    }
}

/// Case-insensitive substring test.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_uppercase().contains(&needle.to_uppercase())
}

/// The three personas taking part in a huddle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PersonaKind {
    BusinessAnalyst,
    SoftwareEngineer,
    ProductOwner,
}

impl PersonaKind {
    /// Agent name used as message author
    pub fn agent_name(&self) -> &'static str {
        match self {
            Self::BusinessAnalyst => "BusinessAnalyst",
            Self::SoftwareEngineer => "SoftwareEngineer",
            Self::ProductOwner => "ProductOwner",
        }
    }

    /// Get a brief description of this persona's role
    pub fn description(&self) -> &'static str {
        match self {
            Self::BusinessAnalyst => {
                "Business Analyst persona for gathering and clarifying requirements."
            }
            Self::SoftwareEngineer => {
                "Software Engineer persona to implement requested features and produce HTML/JS code."
            }
            Self::ProductOwner => {
                "Product Owner persona for reviewing and ensuring all requirements are met."
            }
        }
    }

    /// Directory under the skills root holding this persona's instructions
    pub fn prompt_dir(&self) -> &'static str {
        match self {
            Self::BusinessAnalyst => "BA",
            Self::SoftwareEngineer => "SE",
            Self::ProductOwner => "PO",
        }
    }

    /// Turn order used when the personas are loaded
    pub fn all() -> [Self; 3] {
        [
            Self::BusinessAnalyst,
            Self::SoftwareEngineer,
            Self::ProductOwner,
        ]
    }
}

impl std::fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.agent_name())
    }
}

/// A named role with fixed instructions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Persona {
    pub kind: PersonaKind,
    pub name: String,
    pub description: String,
    pub instructions: String,
}

impl Persona {
    pub fn new(kind: PersonaKind, instructions: impl Into<String>) -> Self {
        Self {
            kind,
            name: kind.agent_name().to_string(),
            description: kind.description().to_string(),
            instructions: instructions.into(),
        }
    }
}
