/*!
# Quill - A Personal Journal

Quill keeps journal entries in a local SQLite database, finds them again by
substring, tag, date, or meaning, and summarizes them with a local Ollama
model.

This file contains the main application flow: it sets up logging, loads the
configuration, opens the database, and dispatches the chosen subcommand.

## Usage

```
quill [OPTIONS] <COMMAND>

Commands:
  add        Create a new entry
  edit       Change the title, content, or tags of an entry
  show       Print an entry
  delete     Delete an entry with its embedding and favorites
  search     Search entries; an empty query lists entries matching the filters
  summarize  Summarize an entry with the LLM
  favorites  List an entry's saved favorite summaries
  prompts    Manage prompt types
  threshold  Show or set the minimum similarity for semantic search
  reindex    Compute embeddings for entries that are missing a current one
```

## Configuration

See [`quill::config`] for the environment variables that are read.
*/

use clap::Parser;
use quill::ai::OllamaClient;
use quill::cli::{parse_date, parse_date_range, start_of_day, CliArgs, Command, PromptsAction};
use quill::config::{validate_config_id, Config};
use quill::constants::{
    DEFAULT_LOG_LEVEL, TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME,
};
use quill::db::entries::{EntryUpdate, NewEntry};
use quill::db::prompt_types::PromptType;
use quill::errors::{AIError, AppError, AppResult};
use quill::ops::{Journal, SearchMode, SearchQuery, SearchResults, SummaryQuality, SummaryResult};
use quill::Database;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_json, args.verbose);

    // Every log line of this invocation carries the same correlation id
    let correlation_id = Uuid::new_v4();
    let span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service = TRACING_SERVICE_NAME,
        correlation_id = %correlation_id
    );
    let _guard = span.enter();

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::AI(AIError::Cancelled)) => {
            info!("Output closed, stopped early");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Installs the tracing subscriber. Logs go to stderr; stdout carries command output.
fn init_logging(json: bool, verbose: bool) {
    let default_level = if verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter);

    if json {
        builder.json().with_current_span(true).init();
    } else {
        builder.with_target(false).init();
    }
}

fn run(args: CliArgs, config: Config) -> AppResult<()> {
    config.validate()?;
    debug!("Configuration: {:?}", config);

    let config_id = args.config_id.unwrap_or_else(|| config.config_id.clone());
    validate_config_id(&config_id)?;

    let db = Database::open(&config.db_path)?;
    db.initialize_schema()?;

    let client = Arc::new(OllamaClient::from_config(&config)?);
    let journal = Journal::new(db, client.clone(), client);
    journal.ensure_default_prompt_types(&config_id)?;

    let mut out = io::stdout().lock();

    match args.command {
        Command::Add {
            title,
            content,
            tags,
            date,
        } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let created_at = date.as_deref().map(parse_date).transpose()?.map(start_of_day);
            let entry = journal.create_entry(&NewEntry {
                title,
                content,
                tags,
                created_at,
            })?;
            writeln!(out, "{}", entry.id)?;
        }

        Command::Edit {
            id,
            title,
            content,
            tags,
            clear_tags,
        } => {
            let tags = if clear_tags {
                Some(Vec::new())
            } else if tags.is_empty() {
                None
            } else {
                Some(tags)
            };
            let entry = journal.update_entry(&id, &EntryUpdate { title, content, tags })?;
            writeln!(out, "Updated {}", entry.id)?;
        }

        Command::Show { id } => {
            let entry = journal.get_entry(&id)?;
            writeln!(out, "# {}", entry.title)?;
            writeln!(out, "id: {}", entry.id)?;
            writeln!(out, "created: {}", entry.created_at.format("%Y-%m-%d %H:%M"))?;
            if !entry.tags.is_empty() {
                let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
                writeln!(out, "tags: {}", tags.join(", "))?;
            }
            writeln!(out)?;
            writeln!(out, "{}", entry.content)?;
        }

        Command::Delete { id } => {
            journal.delete_entry(&id)?;
            writeln!(out, "Deleted {}", id)?;
        }

        Command::Search {
            query,
            semantic,
            from,
            to,
            tags,
            json,
        } => {
            let (date_from, date_to) = parse_date_range(from.as_deref(), to.as_deref())?;
            let request = SearchQuery::new(query)
                .semantic(semantic)
                .between(date_from, date_to)
                .with_tags(tags);
            let results = journal.search(&request, &config_id)?;
            if results.mode == SearchMode::LexicalFallback {
                eprintln!("Note: embeddings are unavailable; showing text matches instead.");
            }
            if json {
                let rendered = serde_json::to_string_pretty(&results).map_err(io::Error::from)?;
                writeln!(out, "{}", rendered)?;
            } else {
                print_search_results(&mut out, &results)?;
            }
        }

        Command::Summarize {
            id,
            prompt_type,
            stream,
            favorite,
        } => {
            let result = if stream {
                let cancel = CancellationToken::new();
                let result = journal.summarize_stream(&id, &prompt_type, &config_id, &cancel, |delta| {
                    if write!(out, "{}", delta).and_then(|_| out.flush()).is_err() {
                        cancel.cancel();
                    }
                })?;
                writeln!(out)?;
                result
            } else {
                let result = journal.summarize(&id, &prompt_type, &config_id)?;
                print_summary(&mut out, &result)?;
                result
            };

            if result.is_degraded() {
                eprintln!("Note: the model did not return structured output; showing its raw text.");
            }
            if favorite {
                let saved = journal.save_favorite(&id, &prompt_type, &result)?;
                writeln!(out, "Saved favorite #{}", saved.id)?;
            }
        }

        Command::Favorites { id } => {
            let favorites = journal.list_favorites(&id)?;
            if favorites.is_empty() {
                writeln!(out, "No favorites saved for {}", id)?;
            }
            for favorite in favorites {
                let marker = match favorite.quality {
                    SummaryQuality::WellFormed => "",
                    SummaryQuality::Degraded => " [unstructured]",
                };
                writeln!(
                    out,
                    "#{} [{}] {} ({}){}",
                    favorite.id,
                    favorite.prompt_type,
                    favorite.saved_at.format("%Y-%m-%d %H:%M"),
                    favorite.mood,
                    marker
                )?;
                writeln!(out, "  {}", favorite.summary)?;
                if !favorite.key_topics.is_empty() {
                    writeln!(out, "  topics: {}", favorite.key_topics.join(", "))?;
                }
            }
        }

        Command::Prompts { action } => match action {
            PromptsAction::List => {
                for prompt_type in journal.prompt_types().list(&config_id)? {
                    writeln!(out, "{}\t{}\t{}", prompt_type.id, prompt_type.name, prompt_type.prompt)?;
                }
            }
            PromptsAction::Set { id, prompt, name } => {
                journal.save_prompt_type(&PromptType {
                    name: name.unwrap_or_else(|| id.clone()),
                    id,
                    config_id: config_id.clone(),
                    prompt,
                })?;
                writeln!(out, "Saved prompt type")?;
            }
            PromptsAction::Reset => {
                journal.prompt_types().reset_defaults(&config_id)?;
                writeln!(out, "Default prompt types restored")?;
            }
        },

        Command::Threshold { value } => {
            if let Some(value) = value {
                journal.set_min_similarity(&config_id, value)?;
            }
            writeln!(out, "{}", journal.min_similarity(&config_id)?)?;
        }

        Command::Reindex { force } => {
            let report = journal.reindex(force)?;
            writeln!(
                out,
                "Reindexed {} of {} entries ({} up to date, {} failed) in {:.1}s",
                report.refreshed,
                report.total,
                report.skipped,
                report.failed,
                report.duration.as_secs_f64()
            )?;
        }
    }

    Ok(())
}

fn print_search_results(out: &mut impl Write, results: &SearchResults) -> io::Result<()> {
    if results.is_empty() {
        writeln!(out, "No matching entries")?;
        return Ok(());
    }
    for hit in &results.hits {
        let entry = &hit.entry;
        match hit.score {
            Some(score) => writeln!(
                out,
                "{}  {}  {:.3}  {}",
                entry.id,
                entry.created_at.format("%Y-%m-%d"),
                score,
                entry.title
            )?,
            None => writeln!(
                out,
                "{}  {}  {}",
                entry.id,
                entry.created_at.format("%Y-%m-%d"),
                entry.title
            )?,
        }
    }
    Ok(())
}

fn print_summary(out: &mut impl Write, result: &SummaryResult) -> io::Result<()> {
    writeln!(out, "{}", result.summary)?;
    if !result.key_topics.is_empty() {
        writeln!(out, "topics: {}", result.key_topics.join(", "))?;
    }
    writeln!(out, "mood: {}", result.mood)
}
