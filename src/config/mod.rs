//! Configuration management for the quill application.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults.
//!
//! # Environment Variables
//!
//! - `QUILL_DB`: Path to the SQLite database (defaults to ~/.local/share/quill/quill.db)
//! - `QUILL_OLLAMA_URL`: Base URL of the Ollama API (defaults to http://127.0.0.1:11434)
//! - `QUILL_EMBED_MODEL`: Embedding model (defaults to nomic-embed-text)
//! - `QUILL_CHAT_MODEL`: Chat model used for summaries (defaults to llama3.2:3b)
//! - `QUILL_CONFIG_ID`: Configuration scope for prompt types and thresholds (defaults to "default")
//! - `QUILL_TIMEOUT_SECS`: HTTP timeout for model calls (defaults to 120)
//! - `QUILL_LOG_FORMAT`: `text` or `json` (defaults to text)
//!
//! Settings that belong to a configuration scope, such as the semantic search
//! threshold, are persisted in the database rather than read from the environment.

use crate::constants::{
    DEFAULT_CHAT_MODEL, DEFAULT_CONFIG_ID, DEFAULT_DB_SUBPATH, DEFAULT_EMBED_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT_SECS, ENV_VAR_HOME, ENV_VAR_QUILL_CHAT_MODEL,
    ENV_VAR_QUILL_CONFIG_ID, ENV_VAR_QUILL_DB, ENV_VAR_QUILL_EMBED_MODEL,
    ENV_VAR_QUILL_LOG_FORMAT, ENV_VAR_QUILL_OLLAMA_URL, ENV_VAR_QUILL_TIMEOUT_SECS,
    LOG_FORMAT_JSON, LOG_FORMAT_TEXT, REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the quill application.
///
/// # Examples
///
/// ```
/// use quill::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("/tmp/quill.db"),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct Config {
    /// Location of the SQLite database.
    pub db_path: PathBuf,

    /// Base URL of the Ollama API.
    pub ollama_url: String,

    /// Model used to embed entries and queries.
    pub embed_model: String,

    /// Model used for summarization.
    pub chat_model: String,

    /// Configuration scope for prompt types and search thresholds.
    pub config_id: String,

    /// HTTP timeout for model calls.
    pub timeout: Duration,

    /// Emit logs as JSON instead of text.
    pub log_json: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &REDACTED_PLACEHOLDER)
            .field("ollama_url", &self.ollama_url)
            .field("embed_model", &self.embed_model)
            .field("chat_model", &self.chat_model)
            .field("config_id", &self.config_id)
            .field("timeout", &self.timeout)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(""),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            config_id: DEFAULT_CONFIG_ID.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_json: false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// The database path is expanded with `shellexpand`, so `~` and `$VAR`
    /// references are honoured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if path expansion fails or a numeric or
    /// enumerated variable holds an unparseable value.
    pub fn load() -> AppResult<Self> {
        let db_raw = env::var(ENV_VAR_QUILL_DB).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_DB_SUBPATH)
        });

        let expanded = shellexpand::full(&db_raw)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
        let db_path = PathBuf::from(expanded.into_owned());

        let timeout_secs = match env::var(ENV_VAR_QUILL_TIMEOUT_SECS) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_VAR_QUILL_TIMEOUT_SECS, raw
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let log_json = match env::var(ENV_VAR_QUILL_LOG_FORMAT) {
            Ok(format) if format.eq_ignore_ascii_case(LOG_FORMAT_JSON) => true,
            Ok(format) if format.eq_ignore_ascii_case(LOG_FORMAT_TEXT) => false,
            Ok(other) => {
                return Err(AppError::Config(format!(
                    "{} must be '{}' or '{}', got '{}'",
                    ENV_VAR_QUILL_LOG_FORMAT, LOG_FORMAT_TEXT, LOG_FORMAT_JSON, other
                )))
            }
            Err(_) => false,
        };

        Ok(Config {
            db_path,
            ollama_url: env::var(ENV_VAR_QUILL_OLLAMA_URL)
                .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            embed_model: env::var(ENV_VAR_QUILL_EMBED_MODEL)
                .unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string()),
            chat_model: env::var(ENV_VAR_QUILL_CHAT_MODEL)
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            config_id: env::var(ENV_VAR_QUILL_CONFIG_ID)
                .unwrap_or_else(|_| DEFAULT_CONFIG_ID.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            log_json,
        })
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - the database path is empty or relative
    /// - the Ollama URL is not an http(s) URL
    /// - either model name is empty
    /// - the configuration scope is empty or contains characters outside `[A-Za-z0-9_-]`
    /// - the timeout is zero
    pub fn validate(&self) -> AppResult<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(AppError::Config("Database path is empty".to_string()));
        }

        if !self.db_path.is_absolute() {
            return Err(AppError::Config(
                "Database path must be an absolute path".to_string(),
            ));
        }

        if !(self.ollama_url.starts_with("http://") || self.ollama_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Ollama URL must start with http:// or https://, got '{}'",
                self.ollama_url
            )));
        }

        if self.embed_model.trim().is_empty() || self.chat_model.trim().is_empty() {
            return Err(AppError::Config("Model names cannot be empty".to_string()));
        }

        validate_config_id(&self.config_id)?;

        if self.timeout.is_zero() {
            return Err(AppError::Config("Timeout must be positive".to_string()));
        }

        Ok(())
    }
}

/// Checks that a configuration scope key is usable as an identifier.
pub fn validate_config_id(config_id: &str) -> AppResult<()> {
    if config_id.is_empty() {
        return Err(AppError::Config(
            "Configuration id cannot be empty".to_string(),
        ));
    }

    if let Some(ch) = config_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(AppError::Config(format!(
            "Configuration id may only contain letters, digits, '_' and '-': found '{}'",
            ch
        )));
    }

    Ok(())
}
