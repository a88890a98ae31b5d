pub mod config;
pub mod error;
pub mod types;

pub use config::{AiConfig, EnglingoConfig, SharedAiConfig};
pub use error::{EnglingoError, Result};
pub use types::*;
