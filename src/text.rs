//! Small text helpers shared by logging and the analyzers.

use regex::Regex;
use std::sync::OnceLock;

/// Number of characters shown when a message is previewed in logs.
pub const PREVIEW_CHARS: usize = 200;

/// Truncate content for log output, appending `...` when cut.
///
/// Counts characters, not bytes, so multi-byte text never splits.
pub fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.char_indices();
    match chars.nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

/// Lowercased `\b\w+\b` tokens of `text`.
pub fn words(text: &str) -> Vec<String> {
    static WORD: OnceLock<Regex> = OnceLock::new();
    let re = WORD.get_or_init(|| Regex::new(r"\b\w+\b").expect("Invalid regex"));
    let lower = text.to_lowercase();
    re.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 200), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééééé", 2), "éé...");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn test_words_strips_punctuation() {
        assert_eq!(
            words("Deep-learning, AI & ML!"),
            vec!["deep", "learning", "ai", "ml"]
        );
    }
}
