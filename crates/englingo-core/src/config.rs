use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EnglingoError, Result};

/// Environment variable overriding [`AiConfig::base_url`].
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
/// Environment variable overriding [`AiConfig::api_key`].
pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
/// Environment variable overriding [`AiConfig::model`].
pub const ENV_MODEL: &str = "OPENROUTER_MODEL";

/// Default tutor persona sent as the system instruction of every chat call.
pub const DEFAULT_PERSONA: &str =
    "You are a friendly and encouraging English tutor. Keep conversation natural but educational.";

/// Top-level configuration for EngLingo.
///
/// Loaded from `~/.englingo/config.toml` by default. This file is also the
/// persisted store for the API credential and the user-editable persona.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnglingoConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub tutor: TutorConfig,
}

impl EnglingoConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EnglingoConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EnglingoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply `OPENROUTER_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BASE_URL) {
            self.ai.base_url = url;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.ai.api_key = key;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.ai.model = model;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Remote model endpoint, credential and model identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// OpenAI-compatible API root, without a trailing `/chat/completions`.
    pub base_url: String,
    /// Bearer credential. Empty means "not configured".
    pub api_key: String,
    /// Model identifier, e.g. `openai/gpt-4o-mini`.
    pub model: String,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "openai/gpt-4o-mini".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl AiConfig {
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Join `path` onto the base URL, tolerating a trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Tutor behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    /// System instruction describing the assistant persona.
    pub persona: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
        }
    }
}

/// Shared, read-mostly handle to the current [`AiConfig`].
///
/// Engines call [`SharedAiConfig::snapshot`] before every request, so an
/// update made through [`SharedAiConfig::replace`] applies to the next call.
#[derive(Debug, Clone, Default)]
pub struct SharedAiConfig {
    inner: Arc<RwLock<AiConfig>>,
}

impl SharedAiConfig {
    pub fn new(config: AiConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current configuration.
    pub fn snapshot(&self) -> AiConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration for subsequent calls.
    pub fn replace(&self, config: AiConfig) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = EnglingoConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.ai.base_url, "https://openrouter.ai/api/v1");
        assert!(config.ai.api_key.is_empty());
        assert_eq!(config.ai.model, "openai/gpt-4o-mini");
        assert_eq!(config.ai.request_timeout_secs, 60);
        assert_eq!(config.tutor.persona, DEFAULT_PERSONA);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[ai]
base_url = "http://localhost:8080/v1"
api_key = "sk-test"
model = "qwen/qwen-2.5-72b"
request_timeout_secs = 5

[tutor]
persona = "You are a strict grammar teacher."
"#;
        let file = create_temp_config(content);
        let config = EnglingoConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.ai.base_url, "http://localhost:8080/v1");
        assert_eq!(config.ai.api_key, "sk-test");
        assert_eq!(config.ai.model, "qwen/qwen-2.5-72b");
        assert_eq!(config.ai.request_timeout_secs, 5);
        assert_eq!(config.tutor.persona, "You are a strict grammar teacher.");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[ai]
api_key = "sk-partial"
"#;
        let file = create_temp_config(content);
        let config = EnglingoConfig::load(file.path()).unwrap();
        assert_eq!(config.ai.api_key, "sk-partial");
        assert_eq!(config.ai.model, "openai/gpt-4o-mini");
        assert_eq!(config.tutor.persona, DEFAULT_PERSONA);
        assert_eq!(config.general.log_level, "warn");
    }

    #[test]
    fn test_load_malformed_config_errors() {
        let file = create_temp_config("[ai\napi_key = ");
        let result = EnglingoConfig::load(file.path());
        assert!(matches!(result, Err(EnglingoError::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = EnglingoConfig::default();
        config.ai.api_key = "sk-saved".to_string();
        config.tutor.persona = "Be brief.".to_string();
        config.save(&path).unwrap();

        let loaded = EnglingoConfig::load(&path).unwrap();
        assert_eq!(loaded.ai.api_key, "sk-saved");
        assert_eq!(loaded.tutor.persona, "Be brief.");
    }

    // ---- Overrides ----

    #[test]
    fn test_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-env"),
            (ENV_MODEL, "anthropic/claude-3.5-haiku"),
        ]
        .into_iter()
        .collect();

        let mut config = EnglingoConfig::default();
        config.ai.api_key = "sk-file".to_string();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.ai.api_key, "sk-env");
        assert_eq!(config.ai.model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.ai.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let mut config = EnglingoConfig::default();
        config.ai.api_key = "sk-file".to_string();
        config.apply_overrides_from(|k| (k == ENV_API_KEY).then(|| "   ".to_string()));
        assert_eq!(config.ai.api_key, "sk-file");
    }

    // ---- AiConfig helpers ----

    #[test]
    fn test_has_credential() {
        let mut ai = AiConfig::default();
        assert!(!ai.has_credential());
        ai.api_key = "  ".to_string();
        assert!(!ai.has_credential());
        ai.api_key = "sk-1".to_string();
        assert!(ai.has_credential());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let mut ai = AiConfig::default();
        assert_eq!(
            ai.endpoint("chat/completions"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        ai.base_url = "http://127.0.0.1:9000/v1/".to_string();
        assert_eq!(ai.endpoint("/models"), "http://127.0.0.1:9000/v1/models");
    }

    #[test]
    fn test_shared_config_snapshot_sees_replacement() {
        let shared = SharedAiConfig::new(AiConfig::default());
        let handle = shared.clone();
        assert!(!shared.snapshot().has_credential());

        handle.replace(AiConfig {
            api_key: "sk-new".to_string(),
            ..AiConfig::default()
        });
        assert_eq!(shared.snapshot().api_key, "sk-new");
    }
}
