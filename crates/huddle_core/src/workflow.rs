//! The huddle run, stage by stage:
//! user message → turn loop → approval gate → extraction → publish.

use huddle_chat::{strategy::user_approved, Message};
use tracing::{error, info, warn};

use crate::approval::{run_gate, GateOutcome};
use crate::artifact::{write_artifact, ArtifactReport, BrowserLauncher};
use crate::config::HuddleConfig;
use crate::context::WorkflowContext;
use crate::driver::{run_turns, TurnReport};
use crate::error::{WorkflowError, WorkflowResult};
use crate::extract::HtmlExtractor;
use crate::publish::{PublishReport, Publisher};

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub turns: TurnReport,
    pub approval: GateOutcome,
    /// Set when the publish script ran
    pub publish: Option<PublishReport>,
    /// Set when HTML was found and written
    pub artifact: Option<ArtifactReport>,
    /// Final conversation snapshot
    pub messages: Vec<Message>,
}

impl WorkflowReport {
    pub fn published(&self) -> bool {
        self.publish.as_ref().is_some_and(PublishReport::success)
    }
}

pub struct Workflow;

impl Workflow {
    /// Run one huddle for `input`.
    ///
    /// Only an empty input is an error; every later stage degrades to a
    /// logged no-op. The artifact is written before the publish hook runs
    /// so the hook pushes the current result.
    pub async fn run(ctx: &mut WorkflowContext, input: &str) -> WorkflowResult<WorkflowReport> {
        if input.trim().is_empty() {
            return Err(WorkflowError::EmptyInput);
        }

        ctx.chat.add_chat_message(Message::user(input));
        info!("Added initial user message to chat history");

        let turns = run_turns(&mut ctx.chat, ctx.config.max_turns, print_turn).await;
        info!(
            "Turn loop finished after {} messages ({:?})",
            turns.produced, turns.stop
        );

        let approval = run_gate(&mut ctx.chat, ctx.prompt.as_mut()).await;

        let messages = ctx.chat.messages().to_vec();
        info!("Retrieved {} messages from chat history", messages.len());

        let artifact = Self::deliver(
            &ctx.config,
            &ctx.extractor,
            ctx.browser.as_ref(),
            &messages,
        );

        let publish = if user_approved(&messages) {
            info!("User approval confirmed in chat history");
            Self::publish(ctx.publisher.as_ref())
        } else {
            if approval != GateOutcome::NotRequested {
                info!("No final approval given, skipping publish");
            }
            None
        };

        info!("Multi-agent workflow completed");

        Ok(WorkflowReport {
            turns,
            approval,
            publish,
            artifact,
            messages,
        })
    }

    /// Run the publish hook, logging the outcome. `None` when the hook
    /// could not be started.
    pub fn publish(publisher: &dyn Publisher) -> Option<PublishReport> {
        match publisher.publish() {
            Ok(report) if report.success() => {
                info!("Publish succeeded");
                if !report.stdout.trim().is_empty() {
                    println!("{}", report.stdout.trim_end());
                }
                Some(report)
            }
            Ok(report) => {
                error!("Publish script failed with exit code {:?}", report.exit_code);
                eprintln!("{}", report.stderr.trim_end());
                Some(report)
            }
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    /// Extract HTML from `messages`, write it to the configured output and
    /// open it when enabled. `None` when nothing was found or written.
    pub fn deliver(
        config: &HuddleConfig,
        extractor: &HtmlExtractor,
        browser: &dyn BrowserLauncher,
        messages: &[Message],
    ) -> Option<ArtifactReport> {
        let Some(extraction) = extractor.extract(messages) else {
            warn!("No HTML code block found from any agent");
            info!("Try asking the Software Engineer to provide HTML code in a ```html code block");
            return None;
        };

        let path = match write_artifact(&config.output_path(), &extraction.html) {
            Ok(path) => path,
            Err(e) => {
                error!("Error writing {}: {}", config.output_file.display(), e);
                return None;
            }
        };
        info!(
            "Wrote {} characters ({})",
            extraction.html.chars().count(),
            extraction.source
        );

        let opened = config.open_browser
            && match browser.open(&path) {
                Ok(()) => {
                    info!("Opened {} in the default browser", path.display());
                    true
                }
                Err(e) => {
                    warn!("{}", e);
                    false
                }
            };

        Some(ArtifactReport {
            path,
            chars: extraction.html.chars().count(),
            source: extraction.source,
            opened,
        })
    }
}

fn print_turn(message: &Message) {
    println!(
        "# {} ({}): '{}'",
        message.role,
        message.author_or_unknown(),
        message.content
    );
}
