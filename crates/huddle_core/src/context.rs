//! Workflow context: everything a run needs, built once at startup.

use huddle_chat::AgentGroupChat;

use crate::approval::{ApprovalPrompt, TerminalPrompt};
use crate::artifact::{BrowserLauncher, SystemBrowser};
use crate::config::HuddleConfig;
use crate::extract::HtmlExtractor;
use crate::publish::{Publisher, ScriptPublisher};

/// State threaded through each stage of a run.
pub struct WorkflowContext {
    pub config: HuddleConfig,
    pub chat: AgentGroupChat,
    pub extractor: HtmlExtractor,
    pub prompt: Box<dyn ApprovalPrompt>,
    pub publisher: Box<dyn Publisher>,
    pub browser: Box<dyn BrowserLauncher>,
}

impl WorkflowContext {
    /// Create a context with terminal, script and system-browser defaults.
    pub fn new(config: HuddleConfig, chat: AgentGroupChat) -> Self {
        let publisher = ScriptPublisher::new(config.publish_script_path(), &config.workspace_root);

        Self {
            config,
            chat,
            extractor: HtmlExtractor::default(),
            prompt: Box::new(TerminalPrompt::default()),
            publisher: Box::new(publisher),
            browser: Box::new(SystemBrowser),
        }
    }

    pub fn with_prompt(mut self, prompt: impl ApprovalPrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn with_publisher(mut self, publisher: impl Publisher + 'static) -> Self {
        self.publisher = Box::new(publisher);
        self
    }

    pub fn with_browser(mut self, browser: impl BrowserLauncher + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    pub fn with_extractor(mut self, extractor: HtmlExtractor) -> Self {
        self.extractor = extractor;
        self
    }
}
