//! Conversation driver: pulls persona turns up to a cap.

use futures::StreamExt;
use huddle_chat::{AgentGroupChat, Message};
use tracing::{info, warn};

/// Why the turn loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStop {
    /// `max_turns` messages were produced
    CapReached,
    /// The group chat ended on its own
    Completed,
    /// A turn failed; collected messages are still used
    Interrupted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Messages produced in this call
    pub produced: usize,
    pub stop: TurnStop,
}

/// Stream turns from the group chat, handing each to `on_message`, until
/// `max_turns` have been produced or the chat stops. Errors end the loop
/// without failing the run.
pub async fn run_turns<F>(chat: &mut AgentGroupChat, max_turns: usize, mut on_message: F) -> TurnReport
where
    F: FnMut(&Message),
{
    let mut produced = 0;

    if max_turns == 0 {
        return TurnReport {
            produced,
            stop: TurnStop::CapReached,
        };
    }

    let turns = chat.invoke();
    futures::pin_mut!(turns);

    while let Some(turn) = turns.next().await {
        match turn {
            Ok(message) => {
                on_message(&message);
                produced += 1;

                if produced >= max_turns {
                    info!("Turn limit ({}) reached, moving to final processing", max_turns);
                    return TurnReport {
                        produced,
                        stop: TurnStop::CapReached,
                    };
                }
            }
            Err(e) => {
                warn!("Group chat interrupted: {}", e);
                return TurnReport {
                    produced,
                    stop: TurnStop::Interrupted(e.to_string()),
                };
            }
        }
    }

    TurnReport {
        produced,
        stop: TurnStop::Completed,
    }
}
