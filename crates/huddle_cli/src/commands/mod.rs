//! CLI command definitions.
//!
//! Each subcommand maps to one way of driving a huddle: a full run, a
//! persona check, or a re-extraction from a saved transcript.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use huddle_core::HuddleConfig;

pub mod extract;
pub mod personas;
pub mod run;

/// huddle - a three-persona build loop with a human approval gate
#[derive(Parser)]
#[command(name = "huddle")]
#[command(version, about = "huddle - Business Analyst, Software Engineer and Product Owner in one chat")]
#[command(long_about = r#"
huddle runs a Business Analyst, a Software Engineer and a Product Owner in a
single round-robin conversation about your request. When the Product Owner
asks for sign-off you approve it, and the newest HTML the engineer wrote is
saved and opened in your browser.

COMMANDS:
  run       → Start a huddle from a prompt
  personas  → List the personas and check their instruction files
  extract   → Re-extract HTML from a saved transcript

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid input or arguments
  3 - LLM not configured
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Workspace directory (defaults to current directory)
    #[arg(short, long, global = true, env = "HUDDLE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a huddle from a prompt
    Run(run::RunArgs),

    /// Load and list the three personas
    Personas(personas::PersonasArgs),

    /// Re-extract HTML from a saved transcript
    Extract(extract::ExtractArgs),
}

/// Resolve the workspace root and load its settings.
pub(crate) fn load_config(workspace: Option<PathBuf>) -> Result<HuddleConfig> {
    let root = match workspace {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    HuddleConfig::load(&root).with_context(|| format!("Failed to load settings for {}", root.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "huddle",
            "--quiet",
            "run",
            "--prompt",
            "Build a timer",
            "--max-turns",
            "6",
            "--no-browser",
        ])
        .unwrap();

        assert!(cli.quiet);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.prompt.as_deref(), Some("Build a timer"));
                assert_eq!(args.max_turns, Some(6));
                assert!(args.no_browser);
                assert!(!args.no_transcript);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_extract_requires_session() {
        assert!(Cli::try_parse_from(["huddle", "extract"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["huddle", "-v", "-q", "personas"]).is_err());
    }

    #[test]
    fn test_load_config_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = load_config(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(config.max_turns, 15);
        assert_eq!(config.workspace_root, temp.path());
    }
}
