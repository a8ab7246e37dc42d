//! Summarization prompts and message builders.
//!
//! This module holds the seed prompt types every configuration scope starts
//! with and the rendering that turns a prompt template plus an entry into the
//! chat messages sent to the model.

use super::ollama::Message;
use crate::db::entries::Entry;

/// A seed prompt type: id, display name, and template text.
#[derive(Debug, Clone, Copy)]
pub struct SeedPromptType {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt: &'static str,
}

/// Prompt types seeded into every configuration scope, in listing order.
pub const DEFAULT_PROMPT_TYPES: [SeedPromptType; 4] = [
    SeedPromptType {
        id: "default",
        name: "Default",
        prompt: "Summarize this journal entry in two or three sentences, capturing what happened and how the writer felt.",
    },
    SeedPromptType {
        id: "detailed",
        name: "Detailed",
        prompt: "Write a thorough summary of this journal entry. Cover the main events, the people involved, the emotions expressed, and any decisions or open questions the writer mentions.",
    },
    SeedPromptType {
        id: "creative",
        name: "Creative",
        prompt: "Retell this journal entry as a short, vivid vignette in the third person, keeping every fact accurate.",
    },
    SeedPromptType {
        id: "concise",
        name: "Concise",
        prompt: "Summarize this journal entry in a single sentence of at most twenty-five words.",
    },
];

/// Looks up the seed definition for a default prompt type id.
pub fn seed_prompt_type(id: &str) -> Option<&'static SeedPromptType> {
    DEFAULT_PROMPT_TYPES.iter().find(|seed| seed.id == id)
}

/// System prompt for summarization requests.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a careful journal assistant. You summarize personal journal entries faithfully, without inventing details, and you always answer with a single JSON object."#;

/// Output contract appended to every rendered prompt.
pub const RESPONSE_FORMAT_INSTRUCTIONS: &str = r#"Respond with only a JSON object of this exact shape, with no text before or after it:
{"summary": "<the summary>", "key_topics": ["<topic>", "..."], "mood": "<one or two words describing the writer's mood>"}"#;

/// Placeholder a template may use to position the entry content.
pub const CONTENT_PLACEHOLDER: &str = "{content}";
/// Placeholder a template may use to position the entry title.
pub const TITLE_PLACEHOLDER: &str = "{title}";

/// Renders a prompt template for an entry.
///
/// Templates that contain `{content}` have the entry substituted in place
/// (`{title}` likewise). Otherwise the template text is treated as the
/// instruction and the entry is appended after it. The JSON output contract is
/// always appended last.
pub fn render_summary_prompt(template: &str, entry: &Entry) -> String {
    let body = if template.contains(CONTENT_PLACEHOLDER) {
        template
            .replace(TITLE_PLACEHOLDER, &entry.title)
            .replace(CONTENT_PLACEHOLDER, &entry.content)
    } else {
        format!(
            "{}\n\nEntry title: {}\n\nEntry:\n---\n{}\n---",
            template.trim_end(),
            entry.title,
            entry.content
        )
    };

    format!("{}\n\n{}", body, RESPONSE_FORMAT_INSTRUCTIONS)
}

/// Builds the chat messages for summarizing an entry with a template.
pub fn summary_messages(template: &str, entry: &Entry) -> Vec<Message> {
    vec![
        Message::system(SUMMARY_SYSTEM_PROMPT),
        Message::user(render_summary_prompt(template, entry)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PROMPT_TYPE_IDS;
    use chrono::Utc;

    fn entry(content: &str) -> Entry {
        Entry {
            id: "e1".to_string(),
            title: "Saturday".to_string(),
            content: content.to_string(),
            tags: Default::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            embedding: None,
        }
    }

    #[test]
    fn test_seed_ids_match_constants() {
        let ids: Vec<_> = DEFAULT_PROMPT_TYPES.iter().map(|s| s.id).collect();
        assert_eq!(ids, DEFAULT_PROMPT_TYPE_IDS.to_vec());
    }

    #[test]
    fn test_seed_lookup() {
        assert_eq!(seed_prompt_type("concise").unwrap().name, "Concise");
        assert!(seed_prompt_type("poetic").is_none());
    }

    #[test]
    fn test_render_appends_entry_after_instruction() {
        let rendered = render_summary_prompt("Summarize briefly.", &entry("Went hiking."));

        let instruction_at = rendered.find("Summarize briefly.").unwrap();
        let content_at = rendered.find("Went hiking.").unwrap();
        let format_at = rendered.find("key_topics").unwrap();
        assert!(instruction_at < content_at);
        assert!(content_at < format_at);
        assert!(rendered.contains("Saturday"));
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let rendered = render_summary_prompt(
            "Title: {title}\nText: {content}\nNow summarize.",
            &entry("Went hiking."),
        );

        assert!(rendered.starts_with("Title: Saturday\nText: Went hiking.\nNow summarize."));
        assert!(!rendered.contains(CONTENT_PLACEHOLDER));
        assert!(rendered.ends_with(RESPONSE_FORMAT_INSTRUCTIONS));
    }

    #[test]
    fn test_summary_messages_structure() {
        let messages = summary_messages("Summarize.", &entry("Body"));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SUMMARY_SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("Body"));
    }
}
