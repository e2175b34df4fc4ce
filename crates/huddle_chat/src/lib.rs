//! # huddle_chat - Persona group chat for huddle
//!
//! This crate provides the conversational half of huddle:
//! - Loading persona instructions from disk
//! - An LLM adapter for Azure OpenAI, OpenAI and Anthropic
//! - A group chat that lets personas take turns over a shared history
//! - Append-only transcripts of every conversation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  PersonaLoader  │────▶│  AgentGroupChat │────▶│   Transcript    │
//! └─────────────────┘     └────────┬────────┘     └─────────────────┘
//!                                  │
//!              ┌───────────────────┼───────────────────┐
//!              ▼                   ▼                   ▼
//!      ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//!      │   Selection   │   │  Termination  │   │ChatCompletion │
//!      └───────────────┘   └───────────────┘   └───────────────┘
//! ```

pub mod error;
pub mod group;
pub mod llm;
pub mod mock;
pub mod personas;
pub mod strategy;
pub mod transcript;
pub mod types;

pub use error::*;
pub use group::*;
pub use llm::*;
pub use personas::*;
pub use strategy::*;
pub use transcript::*;
pub use types::*;
