//! Run command - Start a huddle from a prompt.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use huddle_chat::{
    AgentGroupChat, LlmAdapter, MessageCountTermination, PersonaLoader, Transcript,
    TranscriptStore,
};
use huddle_core::{
    HuddleConfig, LineRead, TerminalInput, TerminalPrompt, Workflow, WorkflowContext,
    WorkflowError, WorkflowReport,
};

const INPUT_PROMPT: &str = "Please enter your prompt for the multi-agent system: ";

#[derive(Args)]
pub struct RunArgs {
    /// What the team should build (read from stdin when omitted)
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Directory holding BA/, SE/ and PO/ instructions
    #[arg(long)]
    pub skills_dir: Option<PathBuf>,

    /// Where the extracted HTML is written
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Script run after approval
    #[arg(long)]
    pub publish_script: Option<PathBuf>,

    /// Maximum number of persona turns
    #[arg(short, long)]
    pub max_turns: Option<usize>,

    /// Do not open the result in a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Do not save a transcript of the conversation
    #[arg(long)]
    pub no_transcript: bool,

    /// LLM provider (azure, openai, anthropic)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model or deployment name
    #[arg(long)]
    pub model: Option<String>,
}

impl RunArgs {
    /// Layer command-line flags over the loaded settings.
    fn apply(&self, config: &mut HuddleConfig) {
        if let Some(dir) = &self.skills_dir {
            config.skills_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(script) = &self.publish_script {
            config.publish_script = script.clone();
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns = max_turns;
        }
        if self.no_browser {
            config.open_browser = false;
        }
        if self.no_transcript {
            config.save_transcript = false;
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = Some(provider.clone());
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
    }
}

pub async fn execute(workspace: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let mut config = super::load_config(workspace)?;
    args.apply(&mut config);
    config.validate()?;

    // One input for the opening prompt and the approval answer
    let terminal = TerminalInput::stdin();
    let input = match &args.prompt {
        Some(prompt) => prompt.clone(),
        None => read_prompt(&terminal).await?,
    };
    if input.trim().is_empty() {
        return Err(WorkflowError::EmptyInput.into());
    }

    let personas = PersonaLoader::new(config.skills_path())
        .load_all()
        .context("Failed to load persona instructions")?;

    let backend = LlmAdapter::from_settings(&config.llm).context("Failed to configure chat backend")?;
    info!(
        "Using {} model '{}'",
        backend.provider().name(),
        backend.model()
    );

    let mut chat = AgentGroupChat::new(personas, Arc::new(backend))?
        .with_termination(MessageCountTermination::new(config.max_turns));

    if config.save_transcript {
        match Transcript::start(TranscriptStore::new(&config.workspace_root)) {
            Ok(transcript) => {
                info!("Recording transcript to {}", transcript.path().display());
                chat = chat.with_transcript(transcript);
            }
            Err(e) => warn!("Transcript disabled: {}", e),
        }
    }

    let mut ctx = WorkflowContext::new(config, chat).with_prompt(TerminalPrompt::new(terminal));
    let report = Workflow::run(&mut ctx, &input).await?;

    print_summary(&report, ctx.chat.transcript().map(Transcript::session_id));
    Ok(())
}

async fn read_prompt(terminal: &TerminalInput) -> Result<String> {
    print!("{}", INPUT_PROMPT);
    std::io::stdout().flush()?;

    match terminal.read_line().await {
        LineRead::Line(line) => Ok(line),
        LineRead::Eof => Ok(String::new()),
        LineRead::Interrupted => anyhow::bail!("Interrupted before a prompt was entered"),
        LineRead::Failed(e) => Err(e).context("Failed to read prompt from stdin"),
    }
}

fn print_summary(report: &WorkflowReport, session: Option<&str>) {
    println!();
    println!("🏁 Huddle finished after {} turns", report.turns.produced);

    match &report.publish {
        Some(publish) if publish.success() => println!("   ✅ Published"),
        Some(publish) => println!("   ❌ Publish failed (exit code {:?})", publish.exit_code),
        None => println!("   ⏭️  Not published"),
    }

    match &report.artifact {
        Some(artifact) => println!(
            "   📄 {} ({} characters, {})",
            artifact.path.display(),
            artifact.chars,
            artifact.source
        ),
        None => println!("   ⚠️  No HTML was produced"),
    }

    if let Some(session) = session {
        println!("   📝 Transcript: {}", session);
        println!();
        println!("Re-extract later with:");
        println!("  huddle extract --session {}", session);
    }
}
