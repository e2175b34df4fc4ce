//! Group chat where personas take turns over a shared history.
//!
//! Each turn the selection strategy picks a persona, the backend produces
//! its reply from the full history, and the termination strategy decides
//! whether the conversation is over. Once complete, further `invoke`
//! calls fail with [`ChatError::ChatComplete`].

use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::{debug, info, warn};

use crate::error::{ChatError, ChatResult};
use crate::llm::ChatCompletion;
use crate::strategy::{
    DefaultTermination, SelectionStrategy, SequentialSelection, TerminationStrategy,
};
use crate::transcript::Transcript;
use crate::types::{Message, Persona};

/// Personas sharing one conversation and one chat backend
pub struct AgentGroupChat {
    personas: Vec<Persona>,
    backend: Arc<dyn ChatCompletion>,
    selection: Box<dyn SelectionStrategy>,
    termination: Box<dyn TerminationStrategy>,
    history: Vec<Message>,
    transcript: Option<Transcript>,
    is_complete: bool,
}

impl AgentGroupChat {
    /// Create a group chat with sequential selection and default termination
    pub fn new(personas: Vec<Persona>, backend: Arc<dyn ChatCompletion>) -> ChatResult<Self> {
        if personas.is_empty() {
            return Err(ChatError::NoPersonas);
        }

        Ok(Self {
            personas,
            backend,
            selection: Box::new(SequentialSelection::new()),
            termination: Box::new(DefaultTermination::default()),
            history: Vec::new(),
            transcript: None,
            is_complete: false,
        })
    }

    pub fn with_selection(mut self, selection: impl SelectionStrategy + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    pub fn with_termination(mut self, termination: impl TerminationStrategy + 'static) -> Self {
        self.termination = Box::new(termination);
        self
    }

    /// Mirror every appended message into a transcript
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Snapshot of the conversation so far
    pub fn messages(&self) -> &[Message] {
        &self.history
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Append a message to the conversation. Transcript write failures are
    /// logged; the in-memory history always receives the message.
    pub fn add_chat_message(&mut self, message: Message) {
        if let Some(transcript) = &self.transcript {
            if let Err(e) = transcript.append(&message) {
                warn!("Failed to append to transcript: {}", e);
            }
        }
        self.history.push(message);
    }

    /// Produce a single turn from the next selected persona
    pub async fn next_turn(&mut self) -> ChatResult<Message> {
        if self.is_complete {
            return Err(ChatError::ChatComplete);
        }

        let index = self.selection.next(&self.personas, &self.history);
        let persona = &self.personas[index];
        debug!("Selected {} for the next turn", persona.name);

        let response = self.backend.complete(persona, &self.history).await?;
        let message = Message::from_persona(persona.name.clone(), response.content);

        let persona = persona.clone();
        self.add_chat_message(message.clone());

        if self.termination.should_terminate(&persona, &self.history) {
            info!("Group chat complete after {} turn", persona.name);
            self.is_complete = true;
        }

        Ok(message)
    }

    /// Stream persona turns until the termination strategy fires, the
    /// iteration bound is reached, or a turn fails.
    pub fn invoke(&mut self) -> impl Stream<Item = ChatResult<Message>> + '_ {
        let limit = self.termination.maximum_iterations();

        stream::unfold(
            (self, 0usize, false),
            move |(chat, iteration, stopped)| async move {
                if stopped || iteration >= limit {
                    return None;
                }

                if chat.is_complete {
                    if iteration == 0 {
                        return Some((Err(ChatError::ChatComplete), (chat, iteration, true)));
                    }
                    return None;
                }

                match chat.next_turn().await {
                    Ok(message) => Some((Ok(message), (chat, iteration + 1, false))),
                    Err(e) => Some((Err(e), (chat, iteration, true))),
                }
            },
        )
    }
}
