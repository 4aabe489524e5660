//! Configuration loading, validation, and management for Ain Bondhu.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `ainbondhu.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Knowledge corpus settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Conversation context settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Semantic fallback search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Conversation store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Gateway (HTTP server) settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("knowledge", &self.knowledge)
            .field("context", &self.context)
            .field("search", &self.search)
            .field("store", &self.store)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Main chat model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Cheap/fast model used for classification and summarization
    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,

    /// Temperature for the main chat model
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per chat response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-request timeout for provider calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-4o".into()
}
fn default_classifier_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            classifier_model: default_classifier_model(),
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory containing the four knowledge artifact files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum verbatim turns fed to the model per call; older turns are
    /// summarized into a single synthetic system turn
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Per-call timeout for the summarization call, in seconds
    #[serde(default = "default_summarizer_timeout")]
    pub summarizer_timeout_secs: u64,

    /// Maximum provider/tool iterations per chat turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_history_limit() -> usize {
    10
}
fn default_summarizer_timeout() -> u64 {
    15
}
fn default_max_iterations() -> u32 {
    6
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            summarizer_timeout_secs: default_summarizer_timeout(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Acts returned by the act-selection stage
    #[serde(default = "default_act_top_k")]
    pub act_top_k: usize,

    /// Sections returned per act by the section-selection stage
    #[serde(default = "default_section_top_k")]
    pub section_top_k: usize,

    /// Per-call timeout for classification calls, in seconds
    #[serde(default = "default_classifier_timeout")]
    pub classifier_timeout_secs: u64,
}

fn default_act_top_k() -> usize {
    3
}
fn default_section_top_k() -> usize {
    4
}
fn default_classifier_timeout() -> u64 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            act_top_k: default_act_top_k(),
            section_top_k: default_section_top_k(),
            classifier_timeout_secs: default_classifier_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "sqlite", "in_memory", or "noop"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (when backend = "sqlite")
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

fn default_store_backend() -> String {
    "in_memory".into()
}
fn default_sqlite_path() -> String {
    "ainbondhu.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins. Empty = same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests allowed per client per minute
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_rate_limit() -> u32 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: vec![],
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`ainbondhu.toml` in the
    /// working directory).
    ///
    /// Environment variable overrides (highest priority):
    /// - `AINBONDHU_API_KEY` / `OPENAI_API_KEY` — API key
    /// - `AINBONDHU_MODEL` — chat model
    /// - `AINBONDHU_DATA_DIR` — knowledge artifact directory
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Path::new("ainbondhu.toml"))?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("AINBONDHU_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("AINBONDHU_MODEL") {
            config.provider.chat_model = model;
        }

        if let Ok(dir) = std::env::var("AINBONDHU_DATA_DIR") {
            config.knowledge.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.context.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "context.history_limit must be at least 1".into(),
            ));
        }

        if self.context.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_iterations must be at least 1".into(),
            ));
        }

        if self.search.act_top_k == 0 || self.search.section_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "search top_k values must be at least 1".into(),
            ));
        }

        match self.store.backend.as_str() {
            "sqlite" | "in_memory" | "noop" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown store backend: {other}"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            knowledge: KnowledgeConfig::default(),
            context: ContextConfig::default(),
            search: SearchConfig::default(),
            store: StoreConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.context.history_limit, 10);
        assert_eq!(config.search.act_top_k, 3);
        assert_eq!(config.search.section_top_k, 4);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.chat_model, config.provider.chat_model);
        assert_eq!(parsed.context.history_limit, config.context.history_limit);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            provider: ProviderConfig { temperature: 5.0, ..Default::default() },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_history_limit_rejected() {
        let config = AppConfig {
            context: ContextConfig { history_limit: 0, ..Default::default() },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_store_backend_rejected() {
        let config = AppConfig {
            store: StoreConfig { backend: "redis".into(), ..Default::default() },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/ainbondhu.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 8000);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[provider]
chat_model = "gpt-4o-mini"

[context]
history_limit = 6

[gateway]
port = 9000
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.provider.chat_model, "gpt-4o-mini");
        assert_eq!(config.context.history_limit, 6);
        assert_eq!(config.gateway.port, 9000);
        // Unspecified sections keep defaults
        assert_eq!(config.search.section_top_k, 4);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
