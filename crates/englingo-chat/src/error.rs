//! Error types for the conversation pipeline.

/// Errors surfaced by the engines and the orchestrator.
///
/// Degraded analysis results are not errors and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("API key missing: set it in the config file or OPENROUTER_API_KEY")]
    MissingCredential,
    #[error("another exchange is already in progress")]
    Busy,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote error ({status}): {body}")]
    Remote { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    /// Whether the caller should prompt the user for configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ChatError::MissingCredential)
    }

    /// Whether the failure came from the remote call itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ChatError::Transport(_) | ChatError::Remote { .. } | ChatError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::MalformedResponse(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
