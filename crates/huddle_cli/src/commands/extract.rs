//! Extract command - Re-extract HTML from a saved transcript.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use huddle_chat::{ChatError, TranscriptStore};
use huddle_core::{HtmlExtractor, SystemBrowser, Workflow};

#[derive(Args)]
pub struct ExtractArgs {
    /// Session id to read, or "latest" for the most recent one
    #[arg(short, long)]
    pub session: String,

    /// Where the extracted HTML is written
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not open the result in a browser
    #[arg(long)]
    pub no_browser: bool,
}

pub async fn execute(workspace: Option<PathBuf>, args: ExtractArgs) -> Result<()> {
    let mut config = super::load_config(workspace)?;
    if let Some(output) = args.output {
        config.output_file = output;
    }
    if args.no_browser {
        config.open_browser = false;
    }

    let store = TranscriptStore::new(&config.workspace_root);
    let session = resolve_session(&store, &args.session)?;
    let messages = store
        .load_messages(&session)
        .with_context(|| format!("Failed to read transcript {}", session))?;
    info!("Loaded {} messages from session {}", messages.len(), session);

    match Workflow::deliver(&config, &HtmlExtractor::default(), &SystemBrowser, &messages) {
        Some(artifact) => {
            println!(
                "📄 Wrote {} ({} characters, {})",
                artifact.path.display(),
                artifact.chars,
                artifact.source
            );
            Ok(())
        }
        None => anyhow::bail!("No HTML found in session {}", session),
    }
}

fn resolve_session(store: &TranscriptStore, requested: &str) -> Result<String> {
    if requested != "latest" {
        return Ok(requested.to_string());
    }
    store
        .list_sessions()?
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::SessionNotFound(requested.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use huddle_chat::Message;

    #[tokio::test]
    async fn test_extract_from_saved_session() {
        let temp = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(temp.path());
        let session = store.create_session().unwrap();
        store
            .append_message(&session, &Message::user("Build a clock"))
            .unwrap();
        store
            .append_message(
                &session,
                &Message::from_persona("SoftwareEngineer", "```html\n<p>tick</p>\n```"),
            )
            .unwrap();

        let args = ExtractArgs {
            session: "latest".to_string(),
            output: Some(PathBuf::from("out/clock.html")),
            no_browser: true,
        };
        execute(Some(temp.path().to_path_buf()), args).await.unwrap();

        let html = fs::read_to_string(temp.path().join("out").join("clock.html")).unwrap();
        assert_eq!(html, "<p>tick</p>");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let temp = tempfile::tempdir().unwrap();
        let args = ExtractArgs {
            session: "missing".to_string(),
            output: None,
            no_browser: true,
        };

        let err = execute(Some(temp.path().to_path_buf()), args).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_latest_without_sessions() {
        let temp = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(temp.path());
        assert!(resolve_session(&store, "latest").is_err());
    }
}
