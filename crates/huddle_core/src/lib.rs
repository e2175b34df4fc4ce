//! # huddle_core
//!
//! Workflow engine for huddle.
//!
//! A run moves through fixed stages, each taking the shared
//! [`WorkflowContext`]:
//!
//! - **Driver**: seeds the conversation and streams persona turns up to a cap
//! - **Approval gate**: asks a human once the Product Owner requests approval
//! - **Extractor**: pulls the HTML artifact out of the conversation
//! - **Artifact**: writes `index.html` and opens it in a browser
//! - **Publish hook**: runs the push script after confirmed approval
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use huddle_chat::{AgentGroupChat, LlmAdapter, PersonaLoader};
//! use huddle_core::{HuddleConfig, WorkflowContext, Workflow};
//!
//! let config = HuddleConfig::load(&workspace)?;
//! let personas = PersonaLoader::new(config.skills_path()).load_all()?;
//! let chat = AgentGroupChat::new(personas, Arc::new(LlmAdapter::from_env()?))?;
//! let mut ctx = WorkflowContext::new(config, chat);
//! let report = Workflow::run(&mut ctx, "Build a tip calculator").await?;
//! ```

pub mod approval;
pub mod artifact;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod extract;
pub mod publish;
pub mod terminal;
pub mod workflow;

// Re-export main types for convenience
pub use approval::{
    approval_requested, run_gate, ApprovalDecision, ApprovalPrompt, GateOutcome, TerminalPrompt,
    APPROVAL_REQUEST_PHRASE,
};
pub use artifact::{write_artifact, ArtifactReport, BrowserLauncher, SystemBrowser};
pub use config::{HuddleConfig, SETTINGS_DIR, SETTINGS_FILE};
pub use context::WorkflowContext;
pub use driver::{run_turns, TurnReport, TurnStop};
pub use error::{WorkflowError, WorkflowResult};
pub use extract::{Extraction, ExtractionRule, ExtractionSource, HtmlExtractor};
pub use publish::{PublishReport, Publisher, ScriptPublisher};
pub use terminal::{LineRead, TerminalInput};
pub use workflow::{Workflow, WorkflowReport};
