//! LLM adapter for chat completions.
//!
//! Supports Azure OpenAI, OpenAI and Anthropic, selected via settings or
//! environment variables.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ChatError, ChatResult};
use crate::types::{Message, MessageRole, Persona};

const MAX_RETRIES: u32 = 3;
const MAX_OUTPUT_TOKENS: u32 = 4096;
const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

/// Capability: given persona instructions and the conversation so far,
/// produce the persona's next message.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, persona: &Persona, history: &[Message]) -> ChatResult<LlmResponse>;
}

/// LLM provider type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
    Anthropic,
}

impl LlmProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Azure { .. } => "azure",
            Self::Anthropic => "anthropic",
        }
    }
}

/// Provider and model preferences from the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

/// Response from LLM including usage info
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        let default_model = match &provider {
            LlmProvider::OpenAI => "gpt-4o-mini".to_string(),
            LlmProvider::Azure { deployment, .. } => deployment.clone(),
            LlmProvider::Anthropic => "claude-sonnet-4-5".to_string(),
        };

        Self {
            provider,
            api_key,
            model: model.unwrap_or(default_model),
            client: reqwest::Client::new(),
        }
    }

    /// Create an LLM adapter from environment variables
    ///
    /// Checks in order:
    /// 1. AZURE_OPENAI_API_KEY (+ endpoint and deployment)
    /// 2. OPENAI_API_KEY
    /// 3. ANTHROPIC_API_KEY
    pub fn from_env() -> ChatResult<Self> {
        let custom_model = non_empty_env("HUDDLE_LLM_MODEL");

        if let Some(adapter) = Self::azure_from_env(custom_model.clone()) {
            return Ok(adapter);
        }

        if let Some(api_key) = non_empty_env("OPENAI_API_KEY") {
            return Ok(Self::new(LlmProvider::OpenAI, api_key, custom_model));
        }

        if let Some(api_key) = non_empty_env("ANTHROPIC_API_KEY") {
            return Ok(Self::new(LlmProvider::Anthropic, api_key, custom_model));
        }

        Err(ChatError::LlmNotConfigured)
    }

    fn azure_from_env(model: Option<String>) -> Option<Self> {
        let api_key = non_empty_env("AZURE_OPENAI_API_KEY")?;
        let endpoint = non_empty_env("AZURE_OPENAI_ENDPOINT")?;
        let deployment = non_empty_env("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME")?;
        let api_version = non_empty_env("AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());

        Some(Self::new(
            LlmProvider::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                deployment,
                api_version,
            },
            api_key,
            model,
        ))
    }

    /// Create an LLM adapter from settings, falling back to env detection
    /// when no provider is pinned.
    pub fn from_settings(settings: &LlmSettings) -> ChatResult<Self> {
        let Some(provider) = settings.provider.as_deref() else {
            let mut adapter = Self::from_env()?;
            if let Some(model) = &settings.model {
                adapter.model = model.clone();
            }
            return Ok(adapter);
        };

        let model = settings
            .model
            .clone()
            .or_else(|| non_empty_env("HUDDLE_LLM_MODEL"));

        match provider.to_lowercase().as_str() {
            "azure" => Self::azure_from_env(model).ok_or(ChatError::LlmNotConfigured),
            "anthropic" => {
                let key = non_empty_env("ANTHROPIC_API_KEY").ok_or(ChatError::LlmNotConfigured)?;
                Ok(Self::new(LlmProvider::Anthropic, key, model))
            }
            "openai" => {
                let key = non_empty_env("OPENAI_API_KEY").ok_or(ChatError::LlmNotConfigured)?;
                Ok(Self::new(LlmProvider::OpenAI, key, model))
            }
            other => Err(ChatError::LlmError(format!("Unknown provider: {}", other))),
        }
    }

    /// Get the current provider
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    // Sends a request, retrying network errors, 429 and 5xx with
    // exponential backoff (1s, 2s).
    async fn send_with_retry<F>(&self, label: &str, build: F) -> ChatResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_secs(1 << (attempt - 1));
                warn!("Retrying {} request in {:?}", label, delay);
                tokio::time::sleep(delay).await;
            }

            let response = match build().send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(ChatError::LlmError(format!("Network error: {}", e)));
                    continue;
                }
            };

            let status = response.status();

            if status.is_server_error() || status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(ChatError::LlmError(format!(
                    "{} API error {} (attempt {}/{}): {}",
                    label,
                    status,
                    attempt + 1,
                    MAX_RETRIES,
                    body
                )));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ChatError::LlmError(format!(
                    "{} API error {}: {}",
                    label, status, body
                )));
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| ChatError::LlmError("Max retries exceeded".to_string())))
    }

    // Azure routes by deployment and its GA api-versions only accept
    // `max_tokens`; OpenAI wants the model and `max_completion_tokens`.
    fn openai_request(&self, persona: &Persona, history: &[Message]) -> OpenAIRequest {
        let messages = openai_messages(persona, history);
        match self.provider {
            LlmProvider::Azure { .. } => OpenAIRequest {
                model: None,
                messages,
                max_tokens: Some(MAX_OUTPUT_TOKENS),
                max_completion_tokens: None,
            },
            LlmProvider::OpenAI | LlmProvider::Anthropic => OpenAIRequest {
                model: Some(self.model.clone()),
                messages,
                max_tokens: None,
                max_completion_tokens: Some(MAX_OUTPUT_TOKENS),
            },
        }
    }

    // OpenAI-compatible chat completion (OpenAI and Azure OpenAI)
    async fn complete_openai(&self, persona: &Persona, history: &[Message]) -> ChatResult<LlmResponse> {
        let request = self.openai_request(persona, history);

        let response = match &self.provider {
            LlmProvider::Azure {
                endpoint,
                deployment,
                api_version,
            } => {
                let url = format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint, deployment, api_version
                );
                self.send_with_retry("Azure OpenAI", || {
                    self.client
                        .post(&url)
                        .header("api-key", &self.api_key)
                        .json(&request)
                })
                .await?
            }
            _ => {
                self.send_with_retry("OpenAI", || {
                    self.client
                        .post("https://api.openai.com/v1/chat/completions")
                        .bearer_auth(&self.api_key)
                        .json(&request)
                })
                .await?
            }
        };

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ChatError::LlmError(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ChatError::LlmError("No response from OpenAI".to_string()))?;

        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(LlmResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    // Anthropic chat completion
    async fn complete_anthropic(&self, persona: &Persona, history: &[Message]) -> ChatResult<LlmResponse> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_OUTPUT_TOKENS,
            system: Some(persona.instructions.clone()),
            messages: anthropic_messages(persona, history),
        };

        let response = self
            .send_with_retry("Anthropic", || {
                self.client
                    .post("https://api.anthropic.com/v1/messages")
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&request)
            })
            .await?;

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ChatError::LlmError(format!("Failed to parse response: {}", e)))?;

        let content = result
            .content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or_else(|| ChatError::LlmError("No response from Anthropic".to_string()))?;

        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0));

        Ok(LlmResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }
}

#[async_trait]
impl ChatCompletion for LlmAdapter {
    async fn complete(&self, persona: &Persona, history: &[Message]) -> ChatResult<LlmResponse> {
        debug!(
            "Requesting {} turn from {} ({} messages of history)",
            persona.name,
            self.provider.name(),
            history.len()
        );
        match self.provider {
            LlmProvider::OpenAI | LlmProvider::Azure { .. } => {
                self.complete_openai(persona, history).await
            }
            LlmProvider::Anthropic => self.complete_anthropic(persona, history).await,
        }
    }
}

fn openai_messages(persona: &Persona, history: &[Message]) -> Vec<OpenAIMessage> {
    std::iter::once(OpenAIMessage {
        role: "system".to_string(),
        name: None,
        content: persona.instructions.clone(),
    })
    .chain(history.iter().map(|m| OpenAIMessage {
        role: m.role.as_str().to_string(),
        name: match m.role {
            MessageRole::Assistant => m.author.clone(),
            MessageRole::User | MessageRole::System => None,
        },
        content: m.content.clone(),
    }))
    .collect()
}

// Anthropic has no per-message name, so turns by other personas are
// labelled inline. System messages from history are folded in as user text.
fn anthropic_messages(persona: &Persona, history: &[Message]) -> Vec<AnthropicMessage> {
    history
        .iter()
        .map(|m| match m.role {
            MessageRole::Assistant => match m.author.as_deref() {
                Some(author) if author != persona.name => AnthropicMessage {
                    role: "user".to_string(),
                    content: format!("[{}]: {}", author, m.content),
                },
                _ => AnthropicMessage {
                    role: "assistant".to_string(),
                    content: m.content.clone(),
                },
            },
            MessageRole::User | MessageRole::System => AnthropicMessage {
                role: "user".to_string(),
                content: m.content.clone(),
            },
        })
        .collect()
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}
