//! huddle CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid input or arguments
//! - 3: LLM not configured

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// Process exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_INPUT: u8 = 2;
    pub const LLM_NOT_CONFIGURED: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    // Credentials may come from a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "huddle=debug"
    } else if cli.quiet {
        "huddle=warn"
    } else {
        "huddle=info"
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(default_level.parse().unwrap())
        .add_directive("warn".parse().unwrap());

    // Logging may already be initialized by an embedding harness
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    let workspace = cli.workspace.clone();
    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(workspace, args).await,
        Commands::Personas(args) => commands::personas::execute(workspace, args).await,
        Commands::Extract(args) => commands::extract::execute(workspace, args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<huddle_core::WorkflowError>() {
            match err {
                huddle_core::WorkflowError::EmptyInput | huddle_core::WorkflowError::Config(_) => {
                    return ExitCodes::INVALID_INPUT
                }
                huddle_core::WorkflowError::Chat(huddle_chat::ChatError::LlmNotConfigured) => {
                    return ExitCodes::LLM_NOT_CONFIGURED
                }
                _ => {}
            }
        }
        if let Some(err) = cause.downcast_ref::<huddle_chat::ChatError>() {
            match err {
                huddle_chat::ChatError::LlmNotConfigured => return ExitCodes::LLM_NOT_CONFIGURED,
                huddle_chat::ChatError::PromptNotFound { .. }
                | huddle_chat::ChatError::SessionNotFound(_) => return ExitCodes::INVALID_INPUT,
                _ => {}
            }
        }
    }
    ExitCodes::GENERAL_ERROR
}
