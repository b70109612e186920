//! Conversation Source
//!
//! Reads the assistant's per-project JSONL conversation logs and extracts
//! the user's own inputs. Tool output, slash-command echoes, meta records
//! and the prompts this tool sends to the assistant are filtered out.

use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::suggestion::TASK_PROMPT_MARKER;

const INTERRUPTED: &str = "[Request interrupted by user for tool use]";

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    is_meta: Option<bool>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: Value,
}

/// Whether a user message is something the user actually typed
pub fn is_user_text(content: &str) -> bool {
    !content.starts_with("Caveat:")
        && !content.contains("<command-name>")
        && !content.contains("<local-command-stdout>")
        && content != INTERRUPTED
        && !content.starts_with(TASK_PROMPT_MARKER)
}

/// Parse one JSONL line into an input, if it qualifies
fn parse_line(line: &str) -> Option<ConversationInput> {
    let record: RawRecord = serde_json::from_str(line).ok()?;
    if record.kind.as_deref() != Some("user") || record.is_meta == Some(true) {
        return None;
    }
    let text = record.message?.content.as_str()?.to_string();
    if !is_user_text(&text) {
        return None;
    }
    let ordering_timestamp = DateTime::parse_from_rfc3339(record.timestamp.as_deref()?)
        .ok()?
        .with_timezone(&Utc);
    Some(ConversationInput::new(text, ordering_timestamp))
}

// ============================================================================
// Inputs
// ============================================================================

/// One qualifying user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationInput {
    pub text: String,
    /// "Jan 5, 2025 at 3:04 PM" in local time
    pub display_timestamp: String,
    pub ordering_timestamp: DateTime<Utc>,
}

impl ConversationInput {
    pub fn new(text: impl Into<String>, ordering_timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            display_timestamp: ordering_timestamp
                .with_timezone(&Local)
                .format("%b %-d, %Y at %-I:%M %p")
                .to_string(),
            ordering_timestamp,
        }
    }
}

/// Every qualifying input of a project, oldest-first
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    pub inputs: Vec<ConversationInput>,
    /// Number of conversation files read
    pub files: usize,
}

impl ConversationHistory {
    /// (first, last) display timestamps
    pub fn time_span(&self) -> Option<(&str, &str)> {
        let first = self.inputs.first()?;
        let last = self.inputs.last()?;
        Some((&first.display_timestamp, &last.display_timestamp))
    }
}

// ============================================================================
// Source
// ============================================================================

/// Conversation log directory of one project
#[derive(Debug, Clone)]
pub struct ConversationSource {
    dir: Option<PathBuf>,
}

impl ConversationSource {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Default location for `project`
    pub fn for_project(project: &Path) -> Self {
        Self::new(vibepoints_foundation::conversation_dir_for(project))
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// `*.jsonl` files sorted by name
    async fn files(&self) -> Vec<PathBuf> {
        let Some(dir) = &self.dir else {
            return Vec::new();
        };
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Conversation directory {} unreadable: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "jsonl") {
                        files.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to list {}: {}", dir.display(), e);
                    break;
                }
            }
        }
        files.sort();
        files
    }

    /// Inputs of each file in file/line order
    async fn scan(&self) -> (Vec<ConversationInput>, usize) {
        let files = self.files().await;
        let mut inputs = Vec::new();
        for path in &files {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => inputs.extend(content.lines().filter_map(parse_line)),
                Err(e) => warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        (inputs, files.len())
    }

    /// Most recent qualifying input; on equal timestamps the later
    /// file/line wins
    pub async fn latest(&self) -> Option<ConversationInput> {
        let (inputs, _) = self.scan().await;
        latest_of(inputs)
    }

    /// All qualifying inputs, oldest-first
    pub async fn history(&self) -> ConversationHistory {
        let (mut inputs, files) = self.scan().await;
        // Stable sort keeps file/line order among equal timestamps
        inputs.sort_by_key(|input| input.ordering_timestamp);
        ConversationHistory { inputs, files }
    }
}

fn latest_of(inputs: Vec<ConversationInput>) -> Option<ConversationInput> {
    inputs.into_iter().fold(None, |best, input| match best {
        Some(b) if b.ordering_timestamp > input.ordering_timestamp => Some(b),
        _ => Some(input),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn user(text: &str, timestamp: &str) -> String {
        json!({
            "type": "user",
            "timestamp": timestamp,
            "message": { "role": "user", "content": text }
        })
        .to_string()
    }

    fn write(dir: &TempDir, name: &str, lines: &[String]) {
        std::fs::write(dir.path().join(name), lines.join("\n")).unwrap();
    }

    #[test]
    fn test_filter_rules() {
        assert!(is_user_text("make the button blue"));
        assert!(!is_user_text("Caveat: the messages below"));
        assert!(!is_user_text("<command-name>/clear</command-name>"));
        assert!(!is_user_text("<local-command-stdout>ok</local-command-stdout>"));
        assert!(!is_user_text(INTERRUPTED));
        assert!(!is_user_text(&format!("{} write a message", TASK_PROMPT_MARKER)));
    }

    #[test]
    fn test_parse_line_rejects_non_user_and_bad_records() {
        let assistant = json!({
            "type": "assistant",
            "timestamp": "2025-01-05T10:00:00Z",
            "message": { "content": "hello" }
        })
        .to_string();
        assert!(parse_line(&assistant).is_none());

        let structured = json!({
            "type": "user",
            "timestamp": "2025-01-05T10:00:00Z",
            "message": { "content": [{ "type": "tool_result" }] }
        })
        .to_string();
        assert!(parse_line(&structured).is_none());

        let undated = json!({ "type": "user", "message": { "content": "hi" } }).to_string();
        assert!(parse_line(&undated).is_none());

        assert!(parse_line("{not json").is_none());
    }

    #[tokio::test]
    async fn test_meta_never_latest() {
        let dir = TempDir::new().unwrap();
        let meta = json!({
            "type": "user",
            "isMeta": true,
            "timestamp": "2025-01-05T12:00:00Z",
            "message": { "content": "meta" }
        })
        .to_string();
        write(
            &dir,
            "a.jsonl",
            &[user("real input", "2025-01-05T11:00:00Z"), meta],
        );

        let source = ConversationSource::new(Some(dir.path().to_path_buf()));
        let latest = source.latest().await.unwrap();
        assert_eq!(latest.text, "real input");
    }

    #[tokio::test]
    async fn test_latest_across_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.jsonl", &[user("newest", "2025-01-05T12:00:00Z")]);
        write(
            &dir,
            "b.jsonl",
            &[
                user("older", "2025-01-05T09:00:00Z"),
                "garbage line".to_string(),
            ],
        );
        std::fs::write(dir.path().join("notes.txt"), user("ignored", "2026-01-01T00:00:00Z"))
            .unwrap();

        let source = ConversationSource::new(Some(dir.path().to_path_buf()));
        assert_eq!(source.latest().await.unwrap().text, "newest");
    }

    #[tokio::test]
    async fn test_tie_later_line_wins() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "a.jsonl",
            &[
                user("first", "2025-01-05T12:00:00Z"),
                user("second", "2025-01-05T12:00:00Z"),
            ],
        );
        let source = ConversationSource::new(Some(dir.path().to_path_buf()));
        assert_eq!(source.latest().await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let source = ConversationSource::new(Some(PathBuf::from("/nonexistent/vibepoints")));
        assert!(source.latest().await.is_none());
        assert!(ConversationSource::new(None).latest().await.is_none());
    }

    #[tokio::test]
    async fn test_history_oldest_first() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.jsonl", &[user("two", "2025-01-05T12:00:00Z")]);
        write(&dir, "b.jsonl", &[user("one", "2025-01-05T08:00:00Z")]);

        let source = ConversationSource::new(Some(dir.path().to_path_buf()));
        let history = source.history().await;
        let texts: Vec<_> = history.inputs.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(history.files, 2);
        assert!(history.time_span().is_some());
    }
}
