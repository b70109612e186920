//! Commit Message Composition
//!
//! Builds the message for each checkpoint creation strategy.

use serde::{Deserialize, Serialize};
use vibepoints_foundation::strings::{collapse_whitespace, is_blank, truncate_with_ellipsis};

// ============================================================================
// Configuration
// ============================================================================

/// Message composition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitMessageConfig {
    /// Prefix applied to custom labels when the option is enabled
    pub custom_prefix: String,

    /// Used by the last-input strategy when no input exists
    pub fallback_message: String,

    /// Marker for automatic checkpoints with file changes
    pub dirty_marker: String,

    /// Marker for automatic checkpoints without file changes
    pub clean_marker: String,

    /// Total width of an automatic checkpoint message
    pub auto_message_width: usize,
}

impl Default for CommitMessageConfig {
    fn default() -> Self {
        Self {
            custom_prefix: "Vibe: ".to_string(),
            fallback_message: "Checkpoint".to_string(),
            dirty_marker: "[*] ".to_string(),
            clean_marker: "[ ] ".to_string(),
            auto_message_width: 72,
        }
    }
}

impl CommitMessageConfig {
    /// Custom strategy: optional prefix, then an optional description
    /// separated by a blank line. Both parts are kept as typed.
    pub fn custom_message(&self, label: &str, description: &str, prefix_enabled: bool) -> String {
        let label = if prefix_enabled {
            format!("{}{}", self.custom_prefix, label)
        } else {
            label.to_string()
        };

        if is_blank(description) {
            label
        } else {
            format!("{}\n\n{}", label, description)
        }
    }

    /// Last-input strategy: the input verbatim, or the fallback
    pub fn last_input_message(&self, input: Option<&str>) -> String {
        match input {
            Some(text) if !is_blank(text) => text.to_string(),
            _ => self.fallback_message.clone(),
        }
    }

    /// Automatic strategy: change marker followed by the input, cut to fit
    /// the configured width
    pub fn auto_message(&self, input: &str, has_changes: bool) -> String {
        let marker = if has_changes {
            &self.dirty_marker
        } else {
            &self.clean_marker
        };
        let room = self
            .auto_message_width
            .saturating_sub(marker.chars().count());
        format!(
            "{}{}",
            marker,
            truncate_with_ellipsis(&collapse_whitespace(input), room)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_with_prefix_no_description() {
        let config = CommitMessageConfig::default();
        assert_eq!(config.custom_message("fix bug", "", true), "Vibe: fix bug");
    }

    #[test]
    fn test_custom_with_prefix_and_description() {
        let config = CommitMessageConfig::default();
        assert_eq!(
            config.custom_message("fix bug", "details", true),
            "Vibe: fix bug\n\ndetails"
        );
    }

    #[test]
    fn test_custom_without_prefix_blank_description() {
        let config = CommitMessageConfig::default();
        assert_eq!(config.custom_message("fix bug", "  \n ", false), "fix bug");
    }

    #[test]
    fn test_custom_keeps_text_verbatim() {
        let config = CommitMessageConfig::default();
        assert_eq!(
            config.custom_message(" fix bug", "  indented\nbody ", true),
            "Vibe:  fix bug\n\n  indented\nbody "
        );
    }

    #[test]
    fn test_last_input_fallback() {
        let config = CommitMessageConfig::default();
        assert_eq!(config.last_input_message(None), "Checkpoint");
        assert_eq!(config.last_input_message(Some("   ")), "Checkpoint");
        assert_eq!(
            config.last_input_message(Some("add dark mode\nplease")),
            "add dark mode\nplease"
        );
    }

    #[test]
    fn test_auto_markers() {
        let config = CommitMessageConfig::default();
        assert_eq!(config.auto_message("make it blue", true), "[*] make it blue");
        assert_eq!(config.auto_message("make it blue", false), "[ ] make it blue");
    }

    #[test]
    fn test_auto_truncates_to_width() {
        let config = CommitMessageConfig::default();
        let long = "word ".repeat(40);
        let message = config.auto_message(&long, true);
        assert_eq!(message.chars().count(), 72);
        assert!(message.starts_with("[*] word word"));
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_auto_collapses_newlines() {
        let config = CommitMessageConfig::default();
        assert_eq!(
            config.auto_message("first line\n\nsecond", false),
            "[ ] first line second"
        );
    }
}
