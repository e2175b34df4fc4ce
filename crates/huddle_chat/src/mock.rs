//! Scripted chat backend for testing.
//!
//! Provides a configurable implementation of the [`ChatCompletion`] trait
//! for use in tests without a real LLM. Replies are returned in order;
//! once the script runs out every persona answers with a stock line.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{ChatError, ChatResult};
use crate::llm::{ChatCompletion, LlmResponse};
use crate::types::{Message, Persona};

/// Predefined outcome for one backend call.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Reply(String),
    Fail(String),
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub persona: String,
    pub instructions: String,
    pub history_len: usize,
}

/// Scripted backend that captures every call.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<RwLock<VecDeque<ScriptedReply>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.script
            .write()
            .push_back(ScriptedReply::Reply(content.into()));
        self
    }

    /// Queue a failed call.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.script
            .write()
            .push_back(ScriptedReply::Fail(message.into()));
        self
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedBackend {
    async fn complete(&self, persona: &Persona, history: &[Message]) -> ChatResult<LlmResponse> {
        self.captured_calls.write().push(CapturedCall {
            persona: persona.name.clone(),
            instructions: persona.instructions.clone(),
            history_len: history.len(),
        });

        let next = self.script.write().pop_front();
        match next {
            Some(ScriptedReply::Reply(content)) => Ok(LlmResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
                model: "scripted".to_string(),
            }),
            Some(ScriptedReply::Fail(message)) => Err(ChatError::LlmError(message)),
            None => Ok(LlmResponse {
                content: format!("{} has nothing further to add.", persona.name),
                input_tokens: 0,
                output_tokens: 0,
                model: "scripted".to_string(),
            }),
        }
    }
}
