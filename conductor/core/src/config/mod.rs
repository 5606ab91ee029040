//! TOML Configuration File Support
//!
//! Centralized configuration loading, with an optional TOML file at
//! `~/.config/inklens/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! host = "localhost"
//! port = 11434
//! prompt_model = "llama3.2"
//! summarizer_model = "qwen2.5:0.5b"
//! enable_prompt = true
//! enable_summarizer = true
//! enable_heuristic = true
//! allow_download = true
//! request_timeout_secs = 120
//! download_timeout_secs = 1800
//!
//! [summarizer]
//! type = "key-points"
//! format = "markdown"
//! length = "medium"
//! context = "Notes from a weekly team meeting"
//!
//! [storage]
//! dir = "/home/me/.local/share/inklens"
//!
//! [autosave]
//! debounce_ms = 300
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{SummarizerOptions, SummaryFormat, SummaryLength, SummaryType};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Ollama host
    pub host: Option<String>,
    /// Ollama port
    pub port: Option<u16>,
    /// Model for the primary prompt backend
    pub prompt_model: Option<String>,
    /// Model for the summarizer backend
    pub summarizer_model: Option<String>,
    /// Whether the prompt backend is configured
    pub enable_prompt: Option<bool>,
    /// Whether the summarizer backend is configured
    pub enable_summarizer: Option<bool>,
    /// Whether the heuristic fallback is configured
    pub enable_heuristic: Option<bool>,
    /// Whether missing models may be pulled
    pub allow_download: Option<bool>,
    /// Generate timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Model download timeout in seconds
    pub download_timeout_secs: Option<u64>,
}

/// Summarizer section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerToml {
    /// Summary shape
    #[serde(rename = "type")]
    pub summary_type: Option<SummaryType>,
    /// Output format
    pub format: Option<SummaryFormat>,
    /// Output length
    pub length: Option<SummaryLength>,
    /// Context hint sent with every summarize request
    pub context: Option<String>,
}

/// Storage section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageToml {
    /// Directory for persisted session state
    pub dir: Option<PathBuf>,
}

/// Autosave section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveToml {
    /// Debounce window for raw input saves, in milliseconds
    pub debounce_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigToml {
    /// Backend configuration section
    pub backend: BackendToml,
    /// Summarizer section
    pub summarizer: SummarizerToml,
    /// Storage configuration section
    pub storage: StorageToml,
    /// Autosave configuration section
    pub autosave: AutosaveToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved backend settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Ollama host
    pub host: String,
    /// Ollama port
    pub port: u16,
    /// Model for the primary prompt backend
    pub prompt_model: String,
    /// Model for the summarizer backend
    pub summarizer_model: String,
    /// Whether the prompt backend is configured
    pub enable_prompt: bool,
    /// Whether the summarizer backend is configured
    pub enable_summarizer: bool,
    /// Whether the heuristic fallback is configured
    pub enable_heuristic: bool,
    /// Whether missing models may be pulled
    pub allow_download: bool,
    /// Generate timeout
    pub request_timeout: Duration,
    /// Model download timeout
    pub download_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            prompt_model: "llama3.2".to_string(),
            summarizer_model: "qwen2.5:0.5b".to_string(),
            enable_prompt: true,
            enable_summarizer: true,
            enable_heuristic: true,
            allow_download: true,
            request_timeout: Duration::from_secs(120),
            download_timeout: Duration::from_secs(1800),
        }
    }
}

/// Centralized configuration
///
/// Use [`load_config`] to load with proper priority handling.
#[derive(Clone, Debug)]
pub struct InklensConfig {
    /// Backend settings
    pub backend: BackendConfig,
    /// Summarizer options
    pub summarizer: SummarizerOptions,
    /// Context hint for summarize requests
    pub summary_context: Option<String>,
    /// Storage directory (`None` = platform data dir)
    pub storage_dir: Option<PathBuf>,
    /// Raw input autosave debounce window
    pub autosave_debounce: Duration,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    /// Source of configuration values
    source: ConfigSource,
}

impl Default for InklensConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            summarizer: SummarizerOptions::default(),
            summary_context: None,
            storage_dir: None,
            autosave_debounce: Duration::from_millis(300),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl InklensConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Resolved storage directory
    #[must_use]
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("inklens")))
    }

    /// Check values that parse but make no sense
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("backend.host is empty".to_string()));
        }
        if self.backend.port == 0 {
            return Err(ConfigError::ValidationError("backend.port is 0".to_string()));
        }
        if self.backend.enable_prompt && self.backend.prompt_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.prompt_model is empty".to_string(),
            ));
        }
        if self.backend.enable_summarizer && self.backend.summarizer_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.summarizer_model is empty".to_string(),
            ));
        }
        if self.backend.request_timeout.is_zero() || self.backend.download_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "backend timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/inklens/config.toml` or
/// `~/.config/inklens/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("inklens").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<InklensConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then apply the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<InklensConfig, ConfigError> {
    let mut config = load_file_config(path)?;
    apply_env_config(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Defaults plus the TOML file, without the environment
fn load_file_config(path: Option<PathBuf>) -> Result<InklensConfig, ConfigError> {
    let mut config = InklensConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ConfigToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut InklensConfig, toml: &ConfigToml) {
    let backend = &toml.backend;
    if let Some(ref host) = backend.host {
        config.backend.host.clone_from(host);
    }
    if let Some(port) = backend.port {
        config.backend.port = port;
    }
    if let Some(ref model) = backend.prompt_model {
        config.backend.prompt_model.clone_from(model);
    }
    if let Some(ref model) = backend.summarizer_model {
        config.backend.summarizer_model.clone_from(model);
    }
    if let Some(enabled) = backend.enable_prompt {
        config.backend.enable_prompt = enabled;
    }
    if let Some(enabled) = backend.enable_summarizer {
        config.backend.enable_summarizer = enabled;
    }
    if let Some(enabled) = backend.enable_heuristic {
        config.backend.enable_heuristic = enabled;
    }
    if let Some(allow) = backend.allow_download {
        config.backend.allow_download = allow;
    }
    if let Some(secs) = backend.request_timeout_secs {
        config.backend.request_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = backend.download_timeout_secs {
        config.backend.download_timeout = Duration::from_secs(secs);
    }

    let summarizer = &toml.summarizer;
    if let Some(summary_type) = summarizer.summary_type {
        config.summarizer.summary_type = summary_type;
    }
    if let Some(format) = summarizer.format {
        config.summarizer.format = format;
    }
    if let Some(length) = summarizer.length {
        config.summarizer.length = length;
    }
    if summarizer.context.is_some() {
        config.summary_context.clone_from(&summarizer.context);
    }
    if toml.storage.dir.is_some() {
        config.storage_dir.clone_from(&toml.storage.dir);
    }
    if let Some(ms) = toml.autosave.debounce_ms {
        config.autosave_debounce = Duration::from_millis(ms);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut InklensConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("OLLAMA_HOST").or_else(|| var("INKLENS_OLLAMA_HOST")) {
        config.backend.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = var("OLLAMA_PORT").or_else(|| var("INKLENS_OLLAMA_PORT")) {
        if let Ok(port) = port.parse::<u16>() {
            config.backend.port = port;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(model) = var("INKLENS_PROMPT_MODEL") {
        config.backend.prompt_model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(model) = var("INKLENS_SUMMARIZER_MODEL") {
        config.backend.summarizer_model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(disable) = var("INKLENS_DISABLE_PROMPT") {
        if disable == "1" || disable.to_lowercase() == "true" {
            config.backend.enable_prompt = false;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(dir) = var("INKLENS_STORAGE_DIR") {
        config.storage_dir = Some(PathBuf::from(dir));
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = var("INKLENS_DEBOUNCE_MS") {
        if let Ok(ms) = ms.parse::<u64>() {
            config.autosave_debounce = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Ollama host override
    pub host: Option<String>,
    /// Ollama port override
    pub port: Option<u16>,
    /// Prompt model override
    pub prompt_model: Option<String>,
    /// Disable every Ollama backend
    pub offline: bool,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host override
    #[must_use]
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set prompt model override
    #[must_use]
    pub fn with_prompt_model(mut self, model: String) -> Self {
        self.prompt_model = Some(model);
        self
    }

    /// Run with the heuristic backend only
    #[must_use]
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut InklensConfig) {
        let mut touched = false;
        if let Some(ref host) = self.host {
            config.backend.host.clone_from(host);
            touched = true;
        }
        if let Some(port) = self.port {
            config.backend.port = port;
            touched = true;
        }
        if let Some(ref model) = self.prompt_model {
            config.backend.prompt_model.clone_from(model);
            touched = true;
        }
        if self.offline {
            config.backend.enable_prompt = false;
            config.backend.enable_summarizer = false;
            config.backend.enable_heuristic = true;
            touched = true;
        }
        if touched {
            config.source = ConfigSource::Cli;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = InklensConfig::default();
        assert_eq!(config.backend.host, "localhost");
        assert_eq!(config.backend.port, 11434);
        assert_eq!(config.autosave_debounce, Duration::from_millis(300));
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            load_file_config(Some(PathBuf::from("/nonexistent/inklens/config.toml"))).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[backend]
port = 9999
prompt_model = "mistral"
enable_summarizer = false

[summarizer]
type = "tldr"
length = "long"
context = "release notes"

[autosave]
debounce_ms = 750
"#
        )
        .unwrap();

        let config = load_file_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.backend.port, 9999);
        assert_eq!(config.backend.prompt_model, "mistral");
        assert!(!config.backend.enable_summarizer);
        assert_eq!(config.backend.host, "localhost");
        assert_eq!(config.summarizer.summary_type, SummaryType::Tldr);
        assert_eq!(config.summarizer.length, SummaryLength::Long);
        assert_eq!(config.summarizer.format, SummaryFormat::Markdown);
        assert_eq!(config.summary_context.as_deref(), Some("release notes"));
        assert_eq!(config.autosave_debounce, Duration::from_millis(750));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[backend\nport = ").unwrap();
        let result = load_file_config(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("OLLAMA_HOST", "gpu-box"),
            ("OLLAMA_PORT", "not-a-port"),
            ("INKLENS_DISABLE_PROMPT", "true"),
            ("INKLENS_DEBOUNCE_MS", "50"),
        ]
        .into_iter()
        .collect();

        let mut config = InklensConfig::default();
        apply_env_config(&mut config, |key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.backend.host, "gpu-box");
        assert_eq!(config.backend.port, 11434);
        assert!(!config.backend.enable_prompt);
        assert_eq!(config.autosave_debounce, Duration::from_millis(50));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = InklensConfig::default();
        ConfigOverrides::new()
            .with_port(1234)
            .with_offline(true)
            .apply(&mut config);

        assert_eq!(config.backend.port, 1234);
        assert!(!config.backend.enable_prompt);
        assert!(!config.backend.enable_summarizer);
        assert!(config.backend.enable_heuristic);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = InklensConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_validation_rejects_zero_port() {
        let mut config = InklensConfig::default();
        config.backend.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
