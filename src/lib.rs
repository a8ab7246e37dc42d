/*!
# Quill

Quill is a personal journal that stores entries in SQLite, retrieves them with
a hybrid of metadata filters, substring matching, and embedding similarity,
and summarizes them with a local LLM under user-selectable prompt types.

## Architecture

- `cli`: Command-line interface handling using clap
- `config`: Configuration loading and validation
- `constants`: Application-wide defaults and names
- `errors`: Error handling infrastructure
- `db`: SQLite persistence for entries, embeddings, prompt types, favorites, and settings
- `ai`: Model runtime traits, the Ollama client, prompts, and response parsing
- `ops`: Search, summarization, and favorites services behind the [`Journal`] facade

## Usage Example

```rust,no_run
use quill::ai::OllamaClient;
use quill::ops::SearchQuery;
use quill::{Config, Database, Journal};
use std::sync::Arc;

fn main() -> quill::AppResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let db = Database::open(&config.db_path)?;
    db.initialize_schema()?;

    let client = Arc::new(OllamaClient::from_config(&config)?);
    let journal = Journal::new(db, client.clone(), client);
    journal.ensure_default_prompt_types(&config.config_id)?;

    let results = journal.search(&SearchQuery::new("hiking").semantic(true), &config.config_id)?;
    for hit in results.hits {
        println!("{} {:?}", hit.entry.title, hit.score);
    }
    Ok(())
}
```
*/

/// Model runtime capabilities and the Ollama client
pub mod ai;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// SQLite persistence
pub mod db;
/// Error types and utilities for error handling
pub mod errors;
/// Search, summarization, and favorites services
pub mod ops;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use db::Database;
pub use errors::{AppError, AppResult};
pub use ops::Journal;
