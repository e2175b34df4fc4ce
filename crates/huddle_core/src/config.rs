//! Workflow configuration.
//!
//! Settings live in `<workspace>/.huddle/settings.json`. Every key is
//! optional; missing keys take the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use huddle_chat::LlmSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{WorkflowError, WorkflowResult};

pub const SETTINGS_DIR: &str = ".huddle";
pub const SETTINGS_FILE: &str = "settings.json";

/// Configuration for one huddle run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct HuddleConfig {
    /// Root that relative paths resolve against
    #[serde(skip)]
    pub workspace_root: PathBuf,
    /// Directory holding `BA/`, `SE/` and `PO/` instructions
    pub skills_dir: PathBuf,
    /// Where the extracted HTML is written
    pub output_file: PathBuf,
    /// Script run after confirmed approval
    pub publish_script: PathBuf,
    /// Cap on persona turns per run
    pub max_turns: usize,
    /// Open the artifact in the default browser
    pub open_browser: bool,
    /// Keep a JSONL transcript under `.huddle/sessions/`
    pub save_transcript: bool,
    /// Provider and model preferences
    pub llm: LlmSettings,
}

impl Default for HuddleConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            skills_dir: PathBuf::from("skills"),
            output_file: PathBuf::from("index.html"),
            publish_script: PathBuf::from("./push_to_github.sh"),
            max_turns: 15,
            open_browser: true,
            save_transcript: true,
            llm: LlmSettings::default(),
        }
    }
}

impl HuddleConfig {
    /// Load settings for a workspace, falling back to defaults when the
    /// settings file does not exist.
    pub fn load(workspace_root: impl AsRef<Path>) -> WorkflowResult<Self> {
        let workspace_root = workspace_root.as_ref().to_path_buf();
        let settings_path = workspace_root.join(SETTINGS_DIR).join(SETTINGS_FILE);

        let mut config = if settings_path.exists() {
            debug!("Loading settings from {}", settings_path.display());
            let content = fs::read_to_string(&settings_path)?;
            serde_json::from_str::<Self>(&content).map_err(|e| {
                WorkflowError::Config(format!("{}: {}", settings_path.display(), e))
            })?
        } else {
            Self::default()
        };

        config.workspace_root = workspace_root;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.max_turns == 0 {
            return Err(WorkflowError::Config(
                "maxTurns must be at least 1".to_string(),
            ));
        }
        if self.output_file.as_os_str().is_empty() {
            return Err(WorkflowError::Config("outputFile must not be empty".to_string()));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    pub fn skills_path(&self) -> PathBuf {
        self.resolve(&self.skills_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_file)
    }

    pub fn publish_script_path(&self) -> PathBuf {
        self.resolve(&self.publish_script)
    }
}
