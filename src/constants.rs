//! Constants used throughout the application.
//!
//! This module contains all constants used in the quill application, organized
//! into logical groups.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "quill";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str =
    "A personal journal with hybrid search and LLM-backed summaries";

// Logging
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "quill";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";

// Configuration Keys & Environment Variables
/// Environment variable for the database path.
pub const ENV_VAR_QUILL_DB: &str = "QUILL_DB";
/// Environment variable for the Ollama base URL.
pub const ENV_VAR_QUILL_OLLAMA_URL: &str = "QUILL_OLLAMA_URL";
/// Environment variable for the embedding model name.
pub const ENV_VAR_QUILL_EMBED_MODEL: &str = "QUILL_EMBED_MODEL";
/// Environment variable for the chat model name.
pub const ENV_VAR_QUILL_CHAT_MODEL: &str = "QUILL_CHAT_MODEL";
/// Environment variable for the configuration scope.
pub const ENV_VAR_QUILL_CONFIG_ID: &str = "QUILL_CONFIG_ID";
/// Environment variable for the HTTP request timeout in seconds.
pub const ENV_VAR_QUILL_TIMEOUT_SECS: &str = "QUILL_TIMEOUT_SECS";
/// Environment variable selecting the log output format.
pub const ENV_VAR_QUILL_LOG_FORMAT: &str = "QUILL_LOG_FORMAT";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default database location, relative to the user's home directory.
pub const DEFAULT_DB_SUBPATH: &str = ".local/share/quill/quill.db";
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// Model Runtime
/// Default Ollama API location.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";
/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2:3b";
/// Default HTTP timeout for model calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// Configuration Scopes & Search
/// Configuration scope used when none is specified.
pub const DEFAULT_CONFIG_ID: &str = "default";
/// Minimum cosine similarity for semantic search results when a scope has no override.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.5;

// Summaries
/// Mood reported for summaries recovered from malformed model output.
pub const UNKNOWN_MOOD: &str = "unknown";
/// Prompt type ids seeded into every configuration scope, in listing order.
pub const DEFAULT_PROMPT_TYPE_IDS: [&str; 4] = ["default", "detailed", "creative", "concise"];
/// Prompt type used when the caller does not pick one.
pub const DEFAULT_PROMPT_TYPE: &str = "default";

// Date/Time
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
