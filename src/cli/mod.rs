//! Command-line interface for quill.

use crate::constants::{APP_NAME, DATE_FORMAT_ISO, DEFAULT_PROMPT_TYPE};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};

/// A personal journal with hybrid search and LLM-backed summaries
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version, propagate_version = true)]
pub struct CliArgs {
    /// Configuration scope for prompt types and thresholds (overrides QUILL_CONFIG_ID)
    #[arg(long, global = true)]
    pub config_id: Option<String>,

    /// Print verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Create a new entry
    Add {
        /// Entry title
        #[arg(short, long)]
        title: String,

        /// Entry content; read from stdin when omitted
        #[arg(short, long)]
        content: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Creation date (format: YYYY-MM-DD or YYYYMMDD), defaults to now
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Change the title, content, or tags of an entry
    Edit {
        /// Entry id
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        /// Replace the entry's tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove all tags
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },

    /// Print an entry
    Show {
        /// Entry id
        id: String,
    },

    /// Delete an entry with its embedding and favorites
    Delete {
        /// Entry id
        id: String,
    },

    /// Search entries; an empty query lists entries matching the filters
    Search {
        /// Text to look for
        #[arg(default_value = "")]
        query: String,

        /// Rank by meaning instead of substring match
        #[arg(short, long)]
        semantic: bool,

        /// Earliest creation date (format: YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        from: Option<String>,

        /// Latest creation date, inclusive (format: YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        to: Option<String>,

        /// Only entries carrying this tag (repeatable, any match)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize an entry with the LLM
    Summarize {
        /// Entry id
        id: String,

        /// Prompt type to use
        #[arg(short, long, default_value = DEFAULT_PROMPT_TYPE)]
        prompt_type: String,

        /// Print the summary as it is generated
        #[arg(long)]
        stream: bool,

        /// Save the result as a favorite
        #[arg(short, long)]
        favorite: bool,
    },

    /// List an entry's saved favorite summaries
    Favorites {
        /// Entry id
        id: String,
    },

    /// Manage prompt types
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },

    /// Show or set the minimum similarity for semantic search
    Threshold {
        /// New threshold between -1 and 1
        #[arg(allow_negative_numbers = true)]
        value: Option<f32>,
    },

    /// Compute embeddings for entries that are missing a current one
    Reindex {
        /// Recompute every embedding
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum PromptsAction {
    /// List prompt types in the scope
    List,

    /// Create or replace a prompt type
    Set {
        /// Prompt type id
        id: String,

        /// Template text; `{content}` and `{title}` are substituted when present
        prompt: String,

        /// Display name, defaults to the id
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Restore the text of the default prompt types
    Reset,
}

/// Parses a date in YYYY-MM-DD or YYYYMMDD format.
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT_ISO)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .map_err(|e| AppError::Validation(format!("Invalid date '{}': {}", raw, e)))
}

/// First instant of a day in UTC.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last stored instant of a day in UTC, at microsecond precision.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + chrono::Duration::days(1) - chrono::Duration::microseconds(1)
}

/// Resolves optional `--from`/`--to` arguments into an inclusive range of instants.
pub fn parse_date_range(
    from: Option<&str>,
    to: Option<&str>,
) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let from = from.map(parse_date).transpose()?.map(start_of_day);
    let to = to.map(parse_date).transpose()?.map(end_of_day);
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_search_defaults() {
        let args = CliArgs::parse_from(["quill", "search"]);
        assert_eq!(
            args.command,
            Command::Search {
                query: String::new(),
                semantic: false,
                from: None,
                to: None,
                tags: vec![],
                json: false,
            }
        );
        assert!(args.config_id.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_search_with_filters() {
        let args = CliArgs::parse_from([
            "quill", "search", "hiking", "-s", "--from", "2024-01-01", "--to", "20240131", "--tag",
            "work", "--tag", "nature", "--config-id", "home",
        ]);

        match args.command {
            Command::Search {
                query,
                semantic,
                from,
                to,
                tags,
                ..
            } => {
                assert_eq!(query, "hiking");
                assert!(semantic);
                assert_eq!(from.as_deref(), Some("2024-01-01"));
                assert_eq!(to.as_deref(), Some("20240131"));
                assert_eq!(tags, vec!["work", "nature"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.config_id.as_deref(), Some("home"));
    }

    #[test]
    fn test_summarize_defaults_to_default_prompt() {
        let args = CliArgs::parse_from(["quill", "summarize", "abc", "--stream", "-f"]);
        assert_eq!(
            args.command,
            Command::Summarize {
                id: "abc".to_string(),
                prompt_type: DEFAULT_PROMPT_TYPE.to_string(),
                stream: true,
                favorite: true,
            }
        );
    }

    #[test]
    fn test_negative_threshold() {
        let args = CliArgs::parse_from(["quill", "threshold", "-0.25"]);
        assert_eq!(args.command, Command::Threshold { value: Some(-0.25) });
    }

    #[test]
    fn test_prompts_set() {
        let args = CliArgs::parse_from(["quill", "prompts", "set", "haiku", "As a haiku.", "-n", "Haiku"]);
        assert_eq!(
            args.command,
            Command::Prompts {
                action: PromptsAction::Set {
                    id: "haiku".to_string(),
                    prompt: "As a haiku.".to_string(),
                    name: Some("Haiku".to_string()),
                }
            }
        );
    }

    #[test]
    fn test_edit_tags_conflict_with_clear() {
        let result = CliArgs::try_parse_from(["quill", "edit", "id", "--tag", "a", "--clear-tags"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(CliArgs::try_parse_from(["quill"]).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let iso = parse_date("2023-01-20").unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day()), (2023, 1, 20));

        let compact = parse_date("20230120").unwrap();
        assert_eq!(iso, compact);

        assert!(matches!(parse_date("01/20/2023"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let (from, to) = parse_date_range(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        let from = from.unwrap();
        let to = to.unwrap();

        assert_eq!(from.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!((to.month(), to.day()), (1, 31));
        assert!(to < start_of_day(parse_date("2024-02-01").unwrap()));

        assert_eq!(parse_date_range(None, None).unwrap(), (None, None));
    }
}
