//! Human approval gate.
//!
//! When an assistant message says "READY FOR USER APPROVAL" the user is
//! asked once whether to approve. Approval is recorded in the conversation
//! as a user message reading `APPROVED`; anything else leaves the
//! conversation untouched.

use std::io::Write;

use async_trait::async_trait;
use huddle_chat::{AgentGroupChat, Message, MessageRole, APPROVAL_TOKEN};
use tracing::{info, warn};

use crate::terminal::{LineRead, TerminalInput};

/// Phrase the Product Owner uses to hand the work to the user
pub const APPROVAL_REQUEST_PHRASE: &str = "READY FOR USER APPROVAL";

/// Token for skipping approval
pub const SKIP_TOKEN: &str = "SKIP";

/// What the user answered at the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Skip,
    /// Any other answer, end of input, or an interrupt
    Cancel,
}

impl ApprovalDecision {
    /// Interpret a free-text answer, ignoring case and surrounding space
    pub fn parse(input: &str) -> Self {
        let answer = input.trim().to_uppercase();
        if answer == APPROVAL_TOKEN {
            Self::Approved
        } else if answer == SKIP_TOKEN {
            Self::Skip
        } else {
            Self::Cancel
        }
    }
}

/// Result of passing through the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No assistant asked for approval
    NotRequested,
    Approved,
    Skipped,
    Cancelled,
}

/// Source of the user's answer
#[async_trait]
pub trait ApprovalPrompt: Send {
    async fn ask(&mut self) -> ApprovalDecision;
}

/// Reads the answer from the terminal. Ctrl-C and end of input count as
/// a cancel.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    input: TerminalInput,
}

impl TerminalPrompt {
    /// Prompt on `input`, sharing its buffer with earlier reads
    pub fn new(input: TerminalInput) -> Self {
        Self { input }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new(TerminalInput::stdin())
    }
}

#[async_trait]
impl ApprovalPrompt for TerminalPrompt {
    async fn ask(&mut self) -> ApprovalDecision {
        println!(
            "Type '{}' to finalize, '{}' to continue without approval, or anything else to cancel.",
            APPROVAL_TOKEN, SKIP_TOKEN
        );
        print!("Your response: ");
        let _ = std::io::stdout().flush();

        match self.input.read_line().await {
            LineRead::Line(line) => ApprovalDecision::parse(&line),
            LineRead::Eof => {
                warn!("Input closed at the approval prompt");
                ApprovalDecision::Cancel
            }
            LineRead::Failed(e) => {
                warn!("Failed to read approval answer: {}", e);
                ApprovalDecision::Cancel
            }
            LineRead::Interrupted => {
                println!();
                warn!("User interrupted the approval prompt");
                ApprovalDecision::Cancel
            }
        }
    }
}

/// Whether any assistant message asks for user approval
pub fn approval_requested(messages: &[Message]) -> bool {
    messages.iter().any(|m| match m.role {
        MessageRole::Assistant => m.mentions(APPROVAL_REQUEST_PHRASE),
        MessageRole::User | MessageRole::System => false,
    })
}

/// Ask for approval at most once, recording an approval in the chat.
pub async fn run_gate(chat: &mut AgentGroupChat, prompt: &mut dyn ApprovalPrompt) -> GateOutcome {
    if !approval_requested(chat.messages()) {
        return GateOutcome::NotRequested;
    }

    info!("The Product Owner says '{}'", APPROVAL_REQUEST_PHRASE);

    match prompt.ask().await {
        ApprovalDecision::Approved => {
            chat.add_chat_message(Message::user(APPROVAL_TOKEN));
            info!("Final user approval added");
            GateOutcome::Approved
        }
        ApprovalDecision::Skip => {
            info!("User chose to skip approval, continuing with HTML extraction only");
            GateOutcome::Skipped
        }
        ApprovalDecision::Cancel => {
            info!("Approval not given, continuing with HTML extraction only");
            GateOutcome::Cancelled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use huddle_chat::mock::ScriptedBackend;
    use huddle_chat::{Persona, PersonaKind};

    struct Answer(ApprovalDecision, usize);

    #[async_trait]
    impl ApprovalPrompt for Answer {
        async fn ask(&mut self) -> ApprovalDecision {
            self.1 += 1;
            self.0
        }
    }

    fn chat_with(messages: Vec<Message>) -> AgentGroupChat {
        let personas = vec![Persona::new(PersonaKind::ProductOwner, "po")];
        let mut chat = AgentGroupChat::new(personas, Arc::new(ScriptedBackend::new())).unwrap();
        for m in messages {
            chat.add_chat_message(m);
        }
        chat
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(ApprovalDecision::parse("approved\n"), ApprovalDecision::Approved);
        assert_eq!(ApprovalDecision::parse("  Approved "), ApprovalDecision::Approved);
        assert_eq!(ApprovalDecision::parse("skip"), ApprovalDecision::Skip);
        assert_eq!(ApprovalDecision::parse("yes please"), ApprovalDecision::Cancel);
        assert_eq!(ApprovalDecision::parse(""), ApprovalDecision::Cancel);
    }

    #[test]
    fn test_approval_requested_only_by_assistants() {
        let asked = [Message::from_persona("ProductOwner", "All done. Ready for user approval!")];
        assert!(approval_requested(&asked));

        let user_said_it = [Message::user("READY FOR USER APPROVAL")];
        assert!(!approval_requested(&user_said_it));
    }

    #[tokio::test]
    async fn test_terminal_prompt_reads_after_earlier_line() {
        let input = TerminalInput::from_reader(std::io::Cursor::new("Build X\nAPPROVED\n"));
        assert!(matches!(input.read_line().await, LineRead::Line(l) if l == "Build X"));

        let mut prompt = TerminalPrompt::new(input.clone());
        assert_eq!(prompt.ask().await, ApprovalDecision::Approved);
        // Closed input cancels
        assert_eq!(prompt.ask().await, ApprovalDecision::Cancel);
    }

    #[tokio::test]
    async fn test_gate_not_requested_never_prompts() {
        let mut chat = chat_with(vec![Message::user("build"), Message::assistant("working on it")]);
        let mut prompt = Answer(ApprovalDecision::Approved, 0);

        let outcome = run_gate(&mut chat, &mut prompt).await;
        assert_eq!(outcome, GateOutcome::NotRequested);
        assert_eq!(prompt.1, 0);
        assert_eq!(chat.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_gate_approval_appends_user_message() {
        let mut chat = chat_with(vec![
            Message::user("build"),
            Message::from_persona("ProductOwner", "READY FOR USER APPROVAL"),
        ]);
        let mut prompt = Answer(ApprovalDecision::Approved, 0);

        let outcome = run_gate(&mut chat, &mut prompt).await;
        assert_eq!(outcome, GateOutcome::Approved);
        assert_eq!(prompt.1, 1);

        let last = chat.messages().last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.content, "APPROVED");
    }

    #[tokio::test]
    async fn test_gate_skip_and_cancel_leave_history_alone() {
        for (decision, expected) in [
            (ApprovalDecision::Skip, GateOutcome::Skipped),
            (ApprovalDecision::Cancel, GateOutcome::Cancelled),
        ] {
            let mut chat = chat_with(vec![
                Message::user("build"),
                Message::from_persona("ProductOwner", "ready for user approval"),
            ]);
            let mut prompt = Answer(decision, 0);

            let outcome = run_gate(&mut chat, &mut prompt).await;
            assert_eq!(outcome, expected);
            assert_eq!(chat.messages().len(), 2);
        }
    }
}
