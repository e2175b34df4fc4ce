//! Writing the extracted HTML and showing it to the user.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{WorkflowError, WorkflowResult};
use crate::extract::ExtractionSource;

/// What was written and whether the browser opened it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    pub path: PathBuf,
    pub source: ExtractionSource,
    /// Size in characters
    pub chars: usize,
    pub opened: bool,
}

/// Opens a file for the user to look at
#[cfg_attr(test, mockall::automock)]
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, path: &Path) -> WorkflowResult<()>;
}

/// Opens files with the platform's default handler.
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, path: &Path) -> WorkflowResult<()> {
        open::that(path).map_err(|e| WorkflowError::Browser(e.to_string()))
    }
}

/// Write the document verbatim, replacing any previous file.
pub fn write_artifact(path: &Path, html: &str) -> WorkflowResult<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;

    let written = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    info!("HTML code saved to {}", written.display());
    Ok(written)
}
