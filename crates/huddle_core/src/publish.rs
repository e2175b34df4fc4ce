//! Publish hook.
//!
//! Runs an external script (by default `./push_to_github.sh`) with no
//! arguments once the user has approved the work. A failing script is
//! reported, never fatal.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{WorkflowError, WorkflowResult};

/// Captured result of one script run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    /// Exit code; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl PublishReport {
    /// Check if the script succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Pushes the approved result somewhere.
#[cfg_attr(test, mockall::automock)]
pub trait Publisher: Send + Sync {
    fn publish(&self) -> WorkflowResult<PublishReport>;
}

/// Runs a script synchronously and captures its output.
#[derive(Debug, Clone)]
pub struct ScriptPublisher {
    script: PathBuf,
    working_dir: PathBuf,
}

impl ScriptPublisher {
    pub fn new(script: impl AsRef<Path>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            script: script.as_ref().to_path_buf(),
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl Publisher for ScriptPublisher {
    fn publish(&self) -> WorkflowResult<PublishReport> {
        info!("Running publish script {}", self.script.display());
        let started = Instant::now();

        let output = Command::new(&self.script)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| {
                WorkflowError::Publish(format!("Failed to run {}: {}", self.script.display(), e))
            })?;

        let report = PublishReport {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        debug!(
            "Publish script exited with {:?} after {}ms",
            report.exit_code, report.duration_ms
        );

        Ok(report)
    }
}
