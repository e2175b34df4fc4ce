//! Persona loading.
//!
//! Each persona reads its instructions from
//! `<skills>/<BA|SE|PO>/system_message.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ChatError, ChatResult};
use crate::types::{Persona, PersonaKind};

/// File name holding a persona's instructions
pub const SYSTEM_MESSAGE_FILE: &str = "system_message.txt";

/// Loads persona instructions from a skills directory
pub struct PersonaLoader {
    skills_dir: PathBuf,
}

impl PersonaLoader {
    pub fn new(skills_dir: impl AsRef<Path>) -> Self {
        Self {
            skills_dir: skills_dir.as_ref().to_path_buf(),
        }
    }

    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Path of the instruction file for a persona
    pub fn prompt_path(&self, kind: PersonaKind) -> PathBuf {
        self.skills_dir.join(kind.prompt_dir()).join(SYSTEM_MESSAGE_FILE)
    }

    /// Load one persona
    pub fn load(&self, kind: PersonaKind) -> ChatResult<Persona> {
        let path = self.prompt_path(kind);
        let instructions = load_system_message(&path)?;
        debug!("Loaded {} instructions from {}", kind, path.display());
        Ok(Persona::new(kind, instructions))
    }

    /// Load all personas in turn order (BA, SE, PO)
    pub fn load_all(&self) -> ChatResult<Vec<Persona>> {
        let personas = PersonaKind::all()
            .into_iter()
            .map(|kind| self.load(kind))
            .collect::<ChatResult<Vec<_>>>()?;

        info!(
            "Loaded {} personas from {}",
            personas.len(),
            self.skills_dir.display()
        );
        Ok(personas)
    }
}

/// Read a system message file verbatim
pub fn load_system_message(path: &Path) -> ChatResult<String> {
    fs::read_to_string(path).map_err(|source| ChatError::PromptNotFound {
        path: path.to_path_buf(),
        source,
    })
}
