//! Configuration loading, validation, and management for arXiv Sentinel.
//!
//! Loads configuration from `~/.arxiv-sentinel/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.arxiv-sentinel/config.toml`.
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

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Action policy and capability settings
    #[serde(default)]
    pub actions: ActionsConfig,

    /// Digest pipeline trigger
    #[serde(default)]
    pub digest: DigestConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
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
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("actions", &self.actions)
            .field("digest", &self.digest)
            .field("providers", &self.providers)
            .finish()
    }
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

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("cse_id", &self.cse_id)
            .field("endpoint", &self.endpoint)
            .field("max_results", &self.max_results)
            .finish()
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Substring that ends the session when it appears in a model reply
    #[serde(default = "default_quit_token")]
    pub quit_token: String,

    /// Consecutive replies without actions before giving up
    #[serde(default = "default_max_idle_turns")]
    pub max_idle_turns: u32,

    /// Hard cap on model invocations per session (unset = unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,

    /// Non-seed messages kept in the transcript (unset = unbounded)
    #[serde(default = "default_transcript_window")]
    pub transcript_window: Option<usize>,

    /// Replace the built-in system instructions entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,

    /// Knowledge-base file returned by GetLib (built-in text when unset or missing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_file: Option<String>,
}

fn default_quit_token() -> String {
    "<<END_SESSION>>".into()
}
fn default_max_idle_turns() -> u32 {
    3
}
fn default_transcript_window() -> Option<usize> {
    Some(64)
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            quit_token: default_quit_token(),
            max_idle_turns: default_max_idle_turns(),
            max_turns: None,
            transcript_window: default_transcript_window(),
            system_prompt_override: None,
            knowledge_file: None,
        }
    }
}

/// Action policy and per-capability settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Directive names that require an explicit yes before running
    #[serde(default = "default_confirm")]
    pub confirm: Vec<String>,

    /// Skip every confirmation prompt
    #[serde(default)]
    pub auto_approve: bool,

    /// Output substrings that mean a running command awaits input
    #[serde(default = "default_input_markers")]
    pub input_markers: Vec<String>,

    /// Timeout for CallAPI and Search requests
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Maximum bytes of content returned to the model per action
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Google Custom Search settings
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_confirm() -> Vec<String> {
    vec![
        "ExecuteCLICommand".into(),
        "ReadFile".into(),
        "CallAPI".into(),
        "Search".into(),
    ]
}
fn default_input_markers() -> Vec<String> {
    vec![
        "(y/n)".into(),
        "[y/N]".into(),
        "[Y/n]".into(),
        "(Y/n)".into(),
        "(y/N)".into(),
        "password:".into(),
    ]
}
fn default_http_timeout() -> u64 {
    30
}
fn default_max_output_bytes() -> usize {
    64 * 1024
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            confirm: default_confirm(),
            auto_approve: false,
            input_markers: default_input_markers(),
            http_timeout_secs: default_http_timeout(),
            max_output_bytes: default_max_output_bytes(),
            search: SearchConfig::default(),
        }
    }
}

/// Google Custom Search JSON API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cse_id: Option<String>,

    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".into()
}
fn default_max_results() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cse_id: None,
            endpoint: default_search_endpoint(),
            max_results: default_max_results(),
        }
    }
}

/// How `sentinel digest` reaches the digest pipeline.
#[derive(Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Deployed cron endpoint to GET (e.g. `https://<app>.vercel.app/api/cron/job`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_url: Option<String>,

    /// Local command that runs the job instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Bearer token sent with the trigger request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_secret: Option<String>,

    /// Print the job output on success
    #[serde(default = "default_true")]
    pub show_output: bool,
}

impl std::fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestConfig")
            .field("trigger_url", &self.trigger_url)
            .field("command", &self.command)
            .field("cron_secret", &redact(&self.cron_secret))
            .field("show_output", &self.show_output)
            .finish()
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            trigger_url: None,
            command: None,
            cron_secret: None,
            show_output: true,
        }
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

impl AppConfig {
    /// Load configuration from the default path (~/.arxiv-sentinel/config.toml).
    ///
    /// Also checks environment variables:
    /// - `SENTINEL_API_KEY` (highest priority), `OPENAI_API_KEY`, `OPENROUTER_API_KEY`
    /// - `SENTINEL_PROVIDER`, `SENTINEL_MODEL`
    /// - `GOOGLE_API_KEY`, `GOOGLE_CSE_ID`
    /// - `SENTINEL_DIGEST_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
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

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("SENTINEL_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .or_else(|| lookup("OPENROUTER_API_KEY"));
        }

        if let Some(provider) = lookup("SENTINEL_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("SENTINEL_MODEL") {
            self.default_model = model;
        }

        let search = &mut self.actions.search;
        if search.api_key.is_none() {
            search.api_key = lookup("GOOGLE_API_KEY");
        }
        if search.cse_id.is_none() {
            search.cse_id = lookup("GOOGLE_CSE_ID");
        }

        if let Some(url) = lookup("SENTINEL_DIGEST_URL") {
            self.digest.trigger_url = Some(url);
            self.digest.command = None;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".arxiv-sentinel")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Default location of the editable knowledge base.
    pub fn default_knowledge_path() -> PathBuf {
        Self::config_dir().join("knowledge.md")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.quit_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.quit_token must not be empty".into(),
            ));
        }

        if self.agent.quit_token.contains("Action:") {
            return Err(ConfigError::ValidationError(
                "agent.quit_token must not contain the action prefix".into(),
            ));
        }

        if self.agent.max_idle_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_idle_turns must be at least 1".into(),
            ));
        }

        if self.agent.max_turns == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.max_turns must be at least 1 when set".into(),
            ));
        }

        if self.agent.transcript_window == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.transcript_window must be at least 1 when set".into(),
            ));
        }

        if self.actions.http_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "actions.http_timeout_secs must be > 0".into(),
            ));
        }

        if self.digest.trigger_url.is_some() && self.digest.command.is_some() {
            return Err(ConfigError::ValidationError(
                "digest.trigger_url and digest.command are mutually exclusive".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
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
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            actions: ActionsConfig::default(),
            digest: DigestConfig::default(),
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
