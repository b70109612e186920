//! Text helpers shared by commit-message composition and rendering
//!
//! All widths are measured in `char`s, never bytes, so multi-byte input
//! is never split mid-character.

/// Ellipsis appended when text is cut
pub const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max_chars` characters, replacing the tail with
/// `...` when anything was removed
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let ellipsis_len = ELLIPSIS.chars().count();
    if max_chars <= ellipsis_len {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - ellipsis_len).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Hard cut without an ellipsis
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Replace runs of whitespace (including newlines) with single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `true` when the text is empty or whitespace only
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
