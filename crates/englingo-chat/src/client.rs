//! OpenAI-compatible completion client shared by all engines.
//!
//! Speaks the `/chat/completions` and `/models` endpoints exposed by
//! OpenRouter and other compatible gateways. The [`AiConfig`] is snapshotted
//! at the start of every call.

use std::time::{Duration, Instant};

use englingo_core::config::{AiConfig, SharedAiConfig};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Substrings that mark a model id as a chat model worth listing.
const MODEL_INCLUDE_KEYWORDS: &[&str] = &["gpt", "claude", "gemini", "deepseek", "qwen"];

/// Substrings that exclude a model id even when it matches an include keyword.
const MODEL_EXCLUDE_KEYWORDS: &[&str] = &["thinking", "embedding"];

// =============================================================================
// Messages
// =============================================================================

/// Role of an entry in a chat-completion message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One role-tagged entry of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion call: ordered messages plus sampling options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
        }
    }

    /// A one-shot request carrying `prompt` as the only user message.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(prompt)])
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

// =============================================================================
// CompletionClient
// =============================================================================

/// HTTP client for the remote text-generation model.
///
/// Cheap to clone; clones share the connection pool and the config handle.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: SharedAiConfig,
}

impl CompletionClient {
    pub fn new(config: SharedAiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// The config handle this client reads before every call.
    pub fn config(&self) -> &SharedAiConfig {
        &self.config
    }

    /// Run one chat completion and return the raw (untrimmed) reply text.
    ///
    /// A `null` or absent `content` yields an empty string; callers decide
    /// what an empty reply means for them.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatError> {
        let config = self.checked_config()?;
        let url = config.endpoint("chat/completions");
        let body = CompletionBody {
            model: &config.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        tracing::debug!(
            model = %config.model,
            messages = request.messages.len(),
            "Sending completion request"
        );
        let started = Instant::now();

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", config.api_key))
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Completion request failed");
            return Err(ChatError::Remote {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::MalformedResponse("response has no choices".to_string()))?;

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(choice.message.content.unwrap_or_default())
    }

    /// List chat models offered by the endpoint, filtered and sorted.
    pub async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let config = self.checked_config()?;
        let response = self
            .http
            .get(config.endpoint("models"))
            .header(AUTHORIZATION, format!("Bearer {}", config.api_key))
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Remote {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let list: ModelList = response.json().await?;
        Ok(filter_models(list.data.into_iter().map(|m| m.id)))
    }

    /// Snapshot the config and fail fast when no credential is set.
    fn checked_config(&self) -> Result<AiConfig, ChatError> {
        let config = self.config.snapshot();
        if !config.has_credential() {
            return Err(ChatError::MissingCredential);
        }
        Ok(config)
    }
}

/// Keep chat-model ids matching an include keyword and no exclude keyword.
pub fn filter_models(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut models: Vec<String> = ids
        .into_iter()
        .filter(|id| {
            let lower = id.to_lowercase();
            !MODEL_EXCLUDE_KEYWORDS.iter().any(|kw| lower.contains(kw))
                && MODEL_INCLUDE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .collect();
    models.sort();
    models
}

// =============================================================================
// Tests
// =============================================================================
