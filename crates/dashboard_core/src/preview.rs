//! crates/dashboard_core/src/preview.rs
//!
//! Plain-text previews of markdown note content for list views.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::Note;

pub const PREVIEW_LENGTH: usize = 100;

/// Markdown syntax stripped from previews, applied in order.
const RULES: &[(&str, &str)] = &[
    (r"\*\*(.*?)\*\*", "$1"),
    (r"__(.*?)__", "$1"),
    (r"\*(.*?)\*", "$1"),
    (r"_(.*?)_", "$1"),
    (r"(?m)^#+\s*", ""),
    (r"\[(.*?)\]\(.*?\)", "$1"),
    (r"`{1,3}([^`]*)`{1,3}", "$1"),
    (r"\s+", " "),
];

fn rules() -> &'static [(Regex, &'static str)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|re| (re, *replacement))
            })
            .collect()
    })
}

/// Truncates `markdown` to `max_chars` characters, then strips the markdown
/// syntax and collapses whitespace.
pub fn markdown_to_plain_text(markdown: &str, max_chars: usize) -> String {
    let mut text: String = markdown.chars().take(max_chars).collect();
    for (re, replacement) in rules() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    text.trim().to_string()
}

impl Note {
    /// Preview text for the note list. Encrypted content is never previewed.
    pub fn preview(&self) -> String {
        if self.encrypted {
            return String::new();
        }
        markdown_to_plain_text(&self.content, PREVIEW_LENGTH)
    }
}
