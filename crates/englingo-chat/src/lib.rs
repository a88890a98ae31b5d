//! Conversation pipeline for EngLingo.
//!
//! Wires translation, chat completion and grammatical analysis around a
//! topic-partitioned conversation log, and exposes the three user-facing
//! operations (submit, new topic, continue) through [`Orchestrator`].

pub mod analysis;
pub mod chat;
pub mod client;
pub mod error;
pub mod log;
pub mod orchestrator;
pub mod prompts;
pub mod script;
pub mod translation;

pub use analysis::{AnalysisEngine, RemoteAnalyzer};
pub use chat::{ChatEngine, RemoteChat};
pub use client::{ChatMessage, ChatRole, CompletionClient, CompletionRequest};
pub use error::ChatError;
pub use log::ConversationLog;
pub use orchestrator::{Orchestrator, SubmitOutcome, CONTINUE_TOKEN};
pub use script::contains_cjk;
pub use translation::{RemoteTranslator, TranslationEngine};
