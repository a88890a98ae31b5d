use thiserror::Error;

/// Top-level error type for EngLingo configuration and persistence.
///
/// Engine and orchestration failures live in `englingo_chat::ChatError`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnglingoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for EnglingoError {
    fn from(err: toml::de::Error) -> Self {
        EnglingoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EnglingoError {
    fn from(err: toml::ser::Error) -> Self {
        EnglingoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EnglingoError {
    fn from(err: serde_json::Error) -> Self {
        EnglingoError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for EngLingo core operations.
pub type Result<T> = std::result::Result<T, EnglingoError>;
