//! Translation engine: renders arbitrary-language text as natural English.

use async_trait::async_trait;

use crate::client::{CompletionClient, CompletionRequest};
use crate::error::ChatError;
use crate::prompts;

/// Renders text in any language as natural English.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate `text` to English.
    ///
    /// A successful call with empty output returns `text` unchanged.
    async fn translate(&self, text: &str) -> Result<String, ChatError>;
}

/// [`TranslationEngine`] backed by the remote completion endpoint.
#[derive(Debug, Clone)]
pub struct RemoteTranslator {
    client: CompletionClient,
}

impl RemoteTranslator {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranslationEngine for RemoteTranslator {
    async fn translate(&self, text: &str) -> Result<String, ChatError> {
        let request = CompletionRequest::prompt(prompts::translate_to_english(text));
        let reply = self.client.complete(&request).await?;
        Ok(english_or_original(&reply, text))
    }
}

/// Trimmed reply, or the original text when the reply is blank.
pub(crate) fn english_or_original(reply: &str, original: &str) -> String {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        tracing::debug!("Translation came back empty, keeping original text");
        original.to_string()
    } else {
        trimmed.to_string()
    }
}
