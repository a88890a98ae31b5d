//! CLI argument definitions for the EngLingo terminal tutor.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use englingo_core::EnglingoConfig;
use std::path::PathBuf;

/// EngLingo: practice English with an AI tutor that explains every sentence.
#[derive(Parser, Debug)]
#[command(name = "englingo", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Model identifier, e.g. openai/gpt-4o-mini.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// API key for the OpenAI-compatible endpoint.
    #[arg(long = "api-key")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Tutor persona sent as the system instruction.
    #[arg(long = "persona")]
    pub persona: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Transcript file: loaded at startup if present, written on exit.
    #[arg(short = 't', long = "transcript")]
    pub transcript: Option<PathBuf>,

    /// Write the resolved configuration to the config file and exit.
    #[arg(long = "save-config")]
    pub save_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ENGLINGO_CONFIG env var > platform default (~/.englingo/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ENGLINGO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the tracing filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG > config file value.
    /// Returns `None` when RUST_LOG should be used as-is.
    pub fn resolve_log_level(&self, config_level: &str) -> Option<String> {
        if let Some(ref level) = self.log_level {
            return Some(level.clone());
        }
        if std::env::var("RUST_LOG").is_ok_and(|v| !v.trim().is_empty()) {
            return None;
        }
        Some(config_level.to_string())
    }

    /// Apply flag overrides on top of an already env-resolved config.
    pub fn apply_overrides(&self, config: &mut EnglingoConfig) {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

        if let Some(url) = non_empty(&self.base_url) {
            config.ai.base_url = url;
        }
        if let Some(key) = non_empty(&self.api_key) {
            config.ai.api_key = key;
        }
        if let Some(model) = non_empty(&self.model) {
            config.ai.model = model;
        }
        if let Some(ref persona) = self.persona {
            config.tutor.persona = persona.clone();
        }
        if let Some(level) = non_empty(&self.log_level) {
            config.general.log_level = level;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".englingo").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".englingo").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let args = CliArgs::parse_from([
            "englingo",
            "--config",
            "/tmp/e.toml",
            "--model",
            "qwen/qwen-2.5-72b",
            "--api-key",
            "sk-cli",
            "--base-url",
            "http://localhost:1234/v1",
            "--persona",
            "Be strict.",
            "--log-level",
            "debug",
            "--transcript",
            "/tmp/t.json",
            "--save-config",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/e.toml"));
        assert_eq!(args.model.as_deref(), Some("qwen/qwen-2.5-72b"));
        assert_eq!(args.transcript, Some(PathBuf::from("/tmp/t.json")));
        assert!(args.save_config);
    }

    #[test]
    fn test_no_flags() {
        let args = CliArgs::parse_from(["englingo"]);
        assert!(args.config.is_none());
        assert!(!args.save_config);
    }

    #[test]
    fn test_apply_overrides() {
        let args = CliArgs::parse_from([
            "englingo",
            "--api-key",
            "sk-cli",
            "--model",
            "anthropic/claude-3.5-haiku",
            "--persona",
            "",
        ]);
        let mut config = EnglingoConfig::default();
        config.ai.api_key = "sk-file".to_string();
        args.apply_overrides(&mut config);

        assert_eq!(config.ai.api_key, "sk-cli");
        assert_eq!(config.ai.model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.ai.base_url, "https://openrouter.ai/api/v1");
        // An explicit empty persona disables the system instruction.
        assert_eq!(config.tutor.persona, "");
    }

    #[test]
    fn test_blank_key_flag_is_ignored() {
        let args = CliArgs::parse_from(["englingo", "--api-key", "  "]);
        let mut config = EnglingoConfig::default();
        config.ai.api_key = "sk-file".to_string();
        args.apply_overrides(&mut config);
        assert_eq!(config.ai.api_key, "sk-file");
    }

    #[test]
    fn test_log_level_flag_wins() {
        let args = CliArgs::parse_from(["englingo", "-l", "trace"]);
        assert_eq!(args.resolve_log_level("warn").as_deref(), Some("trace"));
    }
}
