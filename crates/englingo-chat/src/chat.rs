//! Chat engine: produces the assistant's next turn.

use async_trait::async_trait;
use englingo_core::{Speaker, Turn};

use crate::client::{ChatMessage, CompletionClient, CompletionRequest};
use crate::error::ChatError;

/// Reply used when the model returns an empty completion.
pub const EMPTY_REPLY_APOLOGY: &str = "I'm sorry, I couldn't generate a response.";

const CHAT_TEMPERATURE: f32 = 0.7;

/// Produces the next assistant turn from a context window.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// Generate a reply to `new_input` given the prior `window`.
    ///
    /// `window` must already exclude divider turns and the turn carrying
    /// `new_input` itself; no filtering happens here.
    async fn reply(&self, window: &[Turn], new_input: &str, persona: &str)
        -> Result<String, ChatError>;
}

/// [`ChatEngine`] backed by the remote completion endpoint.
#[derive(Debug, Clone)]
pub struct RemoteChat {
    client: CompletionClient,
}

impl RemoteChat {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatEngine for RemoteChat {
    async fn reply(
        &self,
        window: &[Turn],
        new_input: &str,
        persona: &str,
    ) -> Result<String, ChatError> {
        let request = CompletionRequest::new(build_messages(window, new_input, persona))
            .with_temperature(CHAT_TEMPERATURE);
        let reply = self.client.complete(&request).await?;

        let trimmed = reply.trim();
        if trimmed.is_empty() {
            tracing::warn!("Chat completion was empty, using apology");
            return Ok(EMPTY_REPLY_APOLOGY.to_string());
        }
        Ok(trimmed.to_string())
    }
}

/// Build the role-tagged message list for a chat call.
///
/// Order: optional persona as `system`, then the window in log order, then
/// `new_input` as the final `user` entry.
pub fn build_messages(window: &[Turn], new_input: &str, persona: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(window.len() + 2);

    if !persona.is_empty() {
        messages.push(ChatMessage::system(persona));
    }

    messages.extend(window.iter().map(|turn| match turn.speaker {
        Speaker::Assistant => ChatMessage::assistant(turn.text.as_str()),
        Speaker::User | Speaker::System => ChatMessage::user(turn.text.as_str()),
    }));

    messages.push(ChatMessage::user(new_input));
    messages
}
