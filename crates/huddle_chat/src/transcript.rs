//! Transcript persistence.
//!
//! Conversations are stored in the workspace under:
//! `.huddle/sessions/<sessionId>/messages.jsonl`
//!
//! Each line is one JSON-encoded [`Message`]; the file is append-only.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{ChatError, ChatResult};
use crate::types::{Message, SessionId};

const MESSAGES_FILE: &str = "messages.jsonl";

/// Append-only message log for one workspace
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    workspace_root: PathBuf,
}

impl TranscriptStore {
    /// Create a store rooted at a workspace
    pub fn new(workspace_root: impl AsRef<Path>) -> Self {
        Self {
            workspace_root: workspace_root.as_ref().to_path_buf(),
        }
    }

    fn sessions_dir(&self) -> PathBuf {
        self.workspace_root.join(".huddle").join("sessions")
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(session_id)
    }

    /// Path of a session's message log
    pub fn messages_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(MESSAGES_FILE)
    }

    /// Create an empty transcript for a new session
    pub fn create_session(&self) -> ChatResult<SessionId> {
        let session_id = uuid::Uuid::new_v4().to_string();
        fs::create_dir_all(self.session_dir(&session_id))?;
        File::create(self.messages_path(&session_id))?;
        Ok(session_id)
    }

    /// Append a message to a session
    pub fn append_message(&self, session_id: &str, message: &Message) -> ChatResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.messages_path(session_id))?;

        let json = serde_json::to_string(message)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }

    /// Load all messages for a session
    pub fn load_messages(&self, session_id: &str) -> ChatResult<Vec<Message>> {
        let messages_path = self.messages_path(session_id);

        if !messages_path.exists() {
            return Err(ChatError::SessionNotFound(session_id.to_string()));
        }

        let reader = BufReader::new(File::open(messages_path)?);

        let mut messages = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                messages.push(serde_json::from_str(&line)?);
            }
        }

        Ok(messages)
    }

    /// List session ids, most recently modified first
    pub fn list_sessions(&self) -> ChatResult<Vec<SessionId>> {
        let dir = self.sessions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions: Vec<(SystemTime, SessionId)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let messages = entry.path().join(MESSAGES_FILE);
            if !messages.exists() {
                continue;
            }
            let modified = fs::metadata(&messages)?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            sessions.push((modified, entry.file_name().to_string_lossy().into_owned()));
        }

        sessions.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(sessions.into_iter().map(|(_, id)| id).collect())
    }
}

/// A store bound to one session, as attached to a group chat
#[derive(Debug, Clone)]
pub struct Transcript {
    store: TranscriptStore,
    session_id: SessionId,
}

impl Transcript {
    /// Start a new session in the store
    pub fn start(store: TranscriptStore) -> ChatResult<Self> {
        let session_id = store.create_session()?;
        Ok(Self { store, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn path(&self) -> PathBuf {
        self.store.messages_path(&self.session_id)
    }

    pub fn append(&self, message: &Message) -> ChatResult<()> {
        self.store.append_message(&self.session_id, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use tempfile::tempdir;

    #[test]
    fn test_message_persistence() {
        let temp = tempdir().unwrap();
        let store = TranscriptStore::new(temp.path());
        let transcript = Transcript::start(store.clone()).unwrap();

        transcript.append(&Message::user("Build a landing page")).unwrap();
        transcript
            .append(&Message::from_persona("SoftwareEngineer", "```html\n<p>hi</p>\n```"))
            .unwrap();

        let loaded = store.load_messages(transcript.session_id()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].role, MessageRole::User);
        assert_eq!(loaded[1].author.as_deref(), Some("SoftwareEngineer"));
        assert!(transcript.path().ends_with("messages.jsonl"));
    }

    #[test]
    fn test_missing_session() {
        let temp = tempdir().unwrap();
        let store = TranscriptStore::new(temp.path());
        assert!(matches!(
            store.load_messages("nope"),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_list_sessions() {
        let temp = tempdir().unwrap();
        let store = TranscriptStore::new(temp.path());
        assert!(store.list_sessions().unwrap().is_empty());

        let first = store.create_session().unwrap();
        let second = store.create_session().unwrap();

        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.contains(&first));
        assert!(sessions.contains(&second));
    }
}
