//! Turn selection and termination strategies for the group chat.

use tracing::info;

use crate::types::{Message, MessageRole, Persona};

/// Token a user message must contain to count as approval
pub const APPROVAL_TOKEN: &str = "APPROVED";

/// Iteration bound used when no termination policy is configured
pub const DEFAULT_MAXIMUM_ITERATIONS: usize = 99;

/// Picks which persona speaks next.
pub trait SelectionStrategy: Send + Sync {
    /// Index into `personas` of the next speaker. `personas` is never empty.
    fn next(&mut self, personas: &[Persona], history: &[Message]) -> usize;
}

/// Round robin over personas in load order.
#[derive(Debug, Default)]
pub struct SequentialSelection {
    next_index: usize,
}

impl SequentialSelection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for SequentialSelection {
    fn next(&mut self, personas: &[Persona], _history: &[Message]) -> usize {
        let index = self.next_index % personas.len();
        self.next_index = index + 1;
        index
    }
}

/// Decides when the group chat is done.
pub trait TerminationStrategy: Send + Sync {
    /// Called after `persona` has produced the last message in `history`.
    fn should_terminate(&self, persona: &Persona, history: &[Message]) -> bool;

    /// Upper bound on turns per `invoke` call.
    fn maximum_iterations(&self) -> usize;
}

/// Never terminates on content; only the iteration bound stops the chat.
#[derive(Debug, Clone)]
pub struct DefaultTermination {
    pub maximum_iterations: usize,
}

impl Default for DefaultTermination {
    fn default() -> Self {
        Self {
            maximum_iterations: DEFAULT_MAXIMUM_ITERATIONS,
        }
    }
}

impl TerminationStrategy for DefaultTermination {
    fn should_terminate(&self, _persona: &Persona, _history: &[Message]) -> bool {
        false
    }

    fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }
}

/// Stops once the history holds `max_messages` messages. Message content
/// never ends the chat.
#[derive(Debug, Clone)]
pub struct MessageCountTermination {
    pub max_messages: usize,
}

impl MessageCountTermination {
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }
}

impl TerminationStrategy for MessageCountTermination {
    fn should_terminate(&self, _persona: &Persona, history: &[Message]) -> bool {
        let done = history.len() >= self.max_messages;
        if done {
            info!(
                "Maximum messages ({}) reached, terminating chat",
                self.max_messages
            );
        }
        done
    }

    fn maximum_iterations(&self) -> usize {
        self.max_messages
    }
}

/// Stops once the history holds `max_messages` messages or a user has
/// said "APPROVED". Not used by the turn loop: a prompt that merely
/// mentions approval would end the chat before any code is written.
#[derive(Debug, Clone)]
pub struct ApprovalTermination {
    pub max_messages: usize,
}

impl ApprovalTermination {
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }
}

impl TerminationStrategy for ApprovalTermination {
    fn should_terminate(&self, _persona: &Persona, history: &[Message]) -> bool {
        if history.len() >= self.max_messages {
            info!(
                "Maximum messages ({}) reached, terminating chat",
                self.max_messages
            );
            return true;
        }

        if user_approved(history) {
            info!("Termination condition met: user said {}", APPROVAL_TOKEN);
            return true;
        }

        false
    }

    fn maximum_iterations(&self) -> usize {
        self.max_messages
    }
}

/// Whether any user message contains "APPROVED" in any letter case.
pub fn user_approved(history: &[Message]) -> bool {
    history.iter().any(|m| match m.role {
        MessageRole::User => m.mentions(APPROVAL_TOKEN),
        MessageRole::Assistant | MessageRole::System => false,
    })
}
