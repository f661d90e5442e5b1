//! Configuration loading, validation, and management for ragchat.
//!
//! Loads configuration from `~/.ragchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ragchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub default_top_p: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// System instruction placed at the top of every answer prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Relational database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Session storage configuration
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Timeouts for external calls
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_top_p() -> f32 {
    0.9
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_system_prompt() -> String {
    "You are a helpful AI assistant.".into()
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
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_top_p", &self.default_top_p)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("system_prompt", &self.system_prompt)
            .field("gateway", &self.gateway)
            .field("embedding", &self.embedding)
            .field("retrieval", &self.retrieval)
            .field("database", &self.database)
            .field("sessions", &self.sessions)
            .field("timeouts", &self.timeouts)
            .field("providers", &self.providers)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS. Empty = same-origin only.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Maximum request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: vec![],
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider used for embeddings (defaults to the chat provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector length; responses of any other length are rejected
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dimension() -> usize {
    1536
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Vector index backend: "in_memory" or "opensearch"
    #[serde(default = "default_retrieval_backend")]
    pub backend: String,

    /// top_k used when a retrieval request omits it
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Instruction corpus indexed at gateway start (in-memory backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction_file: Option<String>,

    /// Domain knowledge corpus indexed at gateway start (in-memory backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_file: Option<String>,

    /// Schema description used in structured prompts instead of introspection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_override: Option<String>,

    #[serde(default)]
    pub opensearch: OpenSearchConfig,
}

fn default_retrieval_backend() -> String {
    "in_memory".into()
}
fn default_top_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: default_retrieval_backend(),
            default_top_k: default_top_k(),
            instruction_file: None,
            domain_file: None,
            schema_override: None,
            opensearch: OpenSearchConfig::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenSearchConfig {
    #[serde(default = "default_opensearch_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_opensearch_index")]
    pub index: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_opensearch_endpoint() -> String {
    "https://localhost:9200".into()
}
fn default_opensearch_index() -> String {
    "vector-index".into()
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_opensearch_endpoint(),
            index: default_opensearch_index(),
            username: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for OpenSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchConfig")
            .field("endpoint", &self.endpoint)
            .field("index", &self.index)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. Unset = retrieval mode is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &redact(&self.url))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// "memory" (process lifetime) or "file" (JSON file per session)
    #[serde(default = "default_sessions_backend")]
    pub backend: String,

    /// Directory for the file backend (defaults to ~/.ragchat/sessions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_sessions_backend() -> String {
    "memory".into()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: default_sessions_backend(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Language model completion
    #[serde(default = "default_model_timeout")]
    pub model_secs: u64,

    /// Embedding + vector search, per retrieval
    #[serde(default = "default_retrieval_timeout")]
    pub retrieval_secs: u64,

    /// Generated query execution
    #[serde(default = "default_query_timeout")]
    pub query_secs: u64,
}

fn default_model_timeout() -> u64 {
    120
}
fn default_retrieval_timeout() -> u64 {
    30
}
fn default_query_timeout() -> u64 {
    30
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            model_secs: default_model_timeout(),
            retrieval_secs: default_retrieval_timeout(),
            query_secs: default_query_timeout(),
        }
    }
}

/// Upper bound accepted for any `top_k`.
pub const MAX_TOP_K: usize = 20;

impl AppConfig {
    /// Load configuration from the default path (~/.ragchat/config.toml).
    ///
    /// Also checks environment variables:
    /// - `RAGCHAT_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `RAGCHAT_PROVIDER`, `RAGCHAT_MODEL`
    /// - `DATABASE_URL`, or `DB_USERNAME` + `PASSWORD` + `NEON_URL` + `DATABASE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = var("RAGCHAT_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        }

        if let Some(provider) = var("RAGCHAT_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = var("RAGCHAT_MODEL") {
            self.default_model = model;
        }

        if self.database.url.is_none() {
            self.database.url = var("DATABASE_URL").or_else(|| {
                let user = var("DB_USERNAME")?;
                let password = var("PASSWORD")?;
                let host = var("NEON_URL")?;
                let database = var("DATABASE")?;
                Some(format!("postgresql://{user}:{password}@{host}/{database}?sslmode=require"))
            });
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragchat")
    }

    /// Directory used by the file session store unless overridden.
    pub fn sessions_dir(&self) -> PathBuf {
        self.sessions
            .dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("sessions"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.default_top_p <= 0.0 || self.default_top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "default_top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.default_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "default_max_tokens must be > 0".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError("gateway.port must be > 0".into()));
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be > 0".into(),
            ));
        }

        if !(1..=MAX_TOP_K).contains(&self.retrieval.default_top_k) {
            return Err(ConfigError::ValidationError(format!(
                "retrieval.default_top_k must be between 1 and {MAX_TOP_K}"
            )));
        }

        if !matches!(self.retrieval.backend.as_str(), "in_memory" | "opensearch") {
            return Err(ConfigError::ValidationError(format!(
                "unknown retrieval.backend '{}' (expected in_memory or opensearch)",
                self.retrieval.backend
            )));
        }

        if !matches!(self.sessions.backend.as_str(), "memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "unknown sessions.backend '{}' (expected memory or file)",
                self.sessions.backend
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_top_p: default_top_p(),
            default_max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            gateway: GatewayConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            database: DatabaseConfig::default(),
            sessions: SessionsConfig::default(),
            timeouts: TimeoutsConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
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
