//! Parsing of summary responses.
//!
//! Models are asked for a JSON object but do not always comply. Parsing never
//! fails: output that cannot be read as the expected object becomes a
//! [`ParsedSummary::Degraded`] carrying the best text that could be salvaged.

use crate::constants::UNKNOWN_MOOD;
use serde::{Deserialize, Serialize};

/// Text used when nothing at all can be salvaged from a response.
pub const EMPTY_RESPONSE_FALLBACK: &str = "(the model returned an empty response)";

/// Fields of a well-formed summary response. All three keys are required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryFields {
    pub summary: String,
    pub key_topics: Vec<String>,
    pub mood: String,
}

/// Whether a summary came back in the requested shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryQuality {
    WellFormed,
    /// The reply could not be parsed; the summary holds the salvaged text.
    Degraded,
}

impl SummaryQuality {
    /// Name used when the quality is stored.
    pub fn as_str(self) -> &'static str {
        match self {
            SummaryQuality::WellFormed => "well_formed",
            SummaryQuality::Degraded => "degraded",
        }
    }

    /// Reads a stored name back. Unknown names are `None`.
    pub fn from_stored(name: &str) -> Option<Self> {
        match name {
            "well_formed" => Some(SummaryQuality::WellFormed),
            "degraded" => Some(SummaryQuality::Degraded),
            _ => None,
        }
    }
}

/// Outcome of parsing a summary response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSummary {
    WellFormed(SummaryFields),
    Degraded(String),
}

/// Parses raw model output into summary fields.
pub fn parse_summary_response(raw: &str) -> ParsedSummary {
    let text = strip_code_fences(raw.trim());

    let parsed = serde_json::from_str::<SummaryFields>(text)
        .ok()
        .or_else(|| outer_object(text).and_then(|obj| serde_json::from_str(obj).ok()));

    match parsed {
        Some(fields) if !fields.summary.trim().is_empty() => {
            ParsedSummary::WellFormed(normalize_fields(fields))
        }
        _ => ParsedSummary::Degraded(salvage_text(text)),
    }
}

fn normalize_fields(fields: SummaryFields) -> SummaryFields {
    let key_topics = fields
        .key_topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let mood = match fields.mood.trim() {
        "" => UNKNOWN_MOOD.to_string(),
        mood => mood.to_string(),
    };

    SummaryFields {
        summary: fields.summary.trim().to_string(),
        key_topics,
        mood,
    }
}

/// Removes a surrounding markdown code fence, with or without a language tag.
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// The slice from the first `{` to the last `}`, if any.
fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Best-effort human-readable text from an unparseable response.
fn salvage_text(text: &str) -> String {
    if let Some(partial) = partial_summary_value(text) {
        return partial;
    }
    if text.trim().is_empty() {
        return EMPTY_RESPONSE_FALLBACK.to_string();
    }
    text.trim().to_string()
}

/// Extracts the value of a `"summary"` string field even when the JSON is cut off.
fn partial_summary_value(text: &str) -> Option<String> {
    let key_at = text.find("\"summary\"")?;
    let after_key = text[key_at + "\"summary\"".len()..].trim_start();
    let after_colon = after_key.strip_prefix(':')?.trim_start();
    let body = after_colon.strip_prefix('"')?;

    let mut value = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(other) => value.push(other),
                None => break,
            },
            other => value.push(other),
        }
    }

    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
