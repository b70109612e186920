//! Suggestion Engine
//!
//! Asks the assistant for two checkpoint messages at once:
//! - vibecoder: plain-language message from the user's request and the diff
//! - prototyper: conventional-commit message from the diff alone
//!
//! Both branches run concurrently under their own timeout. One failing
//! branch still yields a usable set flagged as partial.

mod assistant;
mod prompt;

pub use assistant::{AssistantRunner, ClaudeCli};
pub use prompt::{prototyper_prompt, vibecoder_prompt, TASK_PROMPT_MARKER};

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use vibepoints_foundation::strings::take_chars;

use crate::git::{Checkpoint, DiffTarget, FileStatus, RepositoryStatus, VcsBackend};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum SuggestionError {
    #[error("'{0}' is not installed or not on PATH")]
    NotInstalled(String),

    #[error("The assistant is not logged in")]
    NotAuthenticated,

    #[error("No response within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),

    #[error("No suggestions available (vibecoder: {vibecoder}; prototyper: {prototyper})")]
    TotalFailure {
        vibecoder: Box<SuggestionError>,
        prototyper: Box<SuggestionError>,
    },
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Per-branch limit
    pub timeout: Duration,
    /// Diff characters sent to the assistant
    pub max_diff_chars: usize,
    /// Recent subjects included for style
    pub recent_subjects: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_diff_chars: 12_000,
            recent_subjects: 5,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Vibecoder,
    Prototyper,
}

impl SuggestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestionKind::Vibecoder => "vibecoder",
            SuggestionKind::Prototyper => "prototyper",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
}

/// Successful generation; `partial` names the branch that failed, if any
#[derive(Debug, Clone)]
pub struct SuggestionSet {
    pub suggestions: Vec<Suggestion>,
    pub partial: Option<(SuggestionKind, SuggestionError)>,
}

impl SuggestionSet {
    pub fn is_partial(&self) -> bool {
        self.partial.is_some()
    }
}

/// Everything the prompts are built from
#[derive(Debug, Clone, Default)]
pub struct SuggestionContext {
    pub diff: String,
    pub diff_summary: String,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
    pub latest_input: Option<String>,
    pub recent_subjects: Vec<String>,
}

impl SuggestionContext {
    /// Gather diff and file information from the backend. Diff failures
    /// (e.g. before the first commit) degrade to the staged diff, then to
    /// nothing. Untracked files follow as addition patches while the diff
    /// is under its bound.
    pub async fn collect(
        backend: &dyn VcsBackend,
        status: &RepositoryStatus,
        checkpoints: &[Checkpoint],
        latest_input: Option<String>,
        config: &SuggestionConfig,
    ) -> Self {
        let mut diff = match backend.diff(DiffTarget::WorkingTree).await {
            Ok(diff) => diff,
            Err(e) => {
                debug!("Working tree diff unavailable: {}", e);
                backend.diff(DiffTarget::Staged).await.unwrap_or_default()
            }
        };
        let untracked = status
            .files
            .iter()
            .filter(|f| f.status == FileStatus::Untracked);
        for entry in untracked {
            if diff.chars().count() >= config.max_diff_chars {
                break;
            }
            match backend.untracked_diff(&entry.path).await {
                Ok(patch) if patch.is_empty() => {}
                Ok(patch) => {
                    if !diff.is_empty() && !diff.ends_with('\n') {
                        diff.push('\n');
                    }
                    diff.push_str(&patch);
                }
                Err(e) => debug!("No patch for {}: {}", entry.path.display(), e),
            }
        }
        let diff_summary = match backend.diff_summary(DiffTarget::WorkingTree).await {
            Ok(summary) => summary,
            Err(_) => backend
                .diff_summary(DiffTarget::Staged)
                .await
                .unwrap_or_default(),
        };
        let (added, modified, removed) = status.categorized_paths();

        Self {
            diff: bound_diff(&diff, config.max_diff_chars),
            diff_summary,
            added,
            modified,
            removed,
            latest_input,
            recent_subjects: checkpoints
                .iter()
                .take(config.recent_subjects)
                .map(|c| c.subject.clone())
                .collect(),
        }
    }
}

fn bound_diff(diff: &str, max_chars: usize) -> String {
    if diff.chars().count() <= max_chars {
        diff.to_string()
    } else {
        format!("{}\n... [diff truncated]", take_chars(diff, max_chars))
    }
}

// ============================================================================
// Response cleanup
// ============================================================================

/// Text between `<tag>` and `</tag>`, if both are present
pub fn extract_tagged(raw: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = raw.find(&open)? + open.len();
    let end = raw[start..].find(&close)? + start;
    Some(raw[start..end].to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the language tag line, if any
    match rest.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => rest.trim(),
    }
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].trim();
        }
    }
    text
}

/// Reduce a raw response to the bare message
pub fn sanitize_response(kind: SuggestionKind, raw: &str) -> String {
    let tagged = match kind {
        SuggestionKind::Vibecoder => extract_tagged(raw, "message"),
        SuggestionKind::Prototyper => None,
    };
    let text = tagged.as_deref().unwrap_or(raw).trim();
    strip_quotes(strip_code_fence(text)).trim().to_string()
}

/// Combine the two branch results
pub fn aggregate(
    vibecoder: Result<String, SuggestionError>,
    prototyper: Result<String, SuggestionError>,
) -> Result<SuggestionSet, SuggestionError> {
    match (vibecoder, prototyper) {
        (Ok(v), Ok(p)) => Ok(SuggestionSet {
            suggestions: vec![
                Suggestion {
                    kind: SuggestionKind::Vibecoder,
                    message: v,
                },
                Suggestion {
                    kind: SuggestionKind::Prototyper,
                    message: p,
                },
            ],
            partial: None,
        }),
        (Ok(v), Err(e)) => Ok(SuggestionSet {
            suggestions: vec![Suggestion {
                kind: SuggestionKind::Vibecoder,
                message: v,
            }],
            partial: Some((SuggestionKind::Prototyper, e)),
        }),
        (Err(e), Ok(p)) => Ok(SuggestionSet {
            suggestions: vec![Suggestion {
                kind: SuggestionKind::Prototyper,
                message: p,
            }],
            partial: Some((SuggestionKind::Vibecoder, e)),
        }),
        (Err(v), Err(p)) => Err(SuggestionError::TotalFailure {
            vibecoder: Box::new(v),
            prototyper: Box::new(p),
        }),
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone)]
pub struct SuggestionEngine {
    runner: Arc<dyn AssistantRunner>,
    config: SuggestionConfig,
}

impl SuggestionEngine {
    pub fn new(runner: Arc<dyn AssistantRunner>, config: SuggestionConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    async fn branch(&self, kind: SuggestionKind, prompt: String) -> Result<String, SuggestionError> {
        let result = tokio::time::timeout(self.config.timeout, self.runner.run(&prompt))
            .await
            .unwrap_or(Err(SuggestionError::Timeout(self.config.timeout)))
            .map(|raw| sanitize_response(kind, &raw))
            .and_then(|message| {
                if message.is_empty() {
                    Err(SuggestionError::Other("Empty response".to_string()))
                } else {
                    Ok(message)
                }
            });
        if let Err(e) = &result {
            warn!("{} suggestion failed: {}", kind.label(), e);
        }
        result
    }

    /// Run both branches concurrently and aggregate
    pub async fn generate(&self, context: &SuggestionContext) -> Result<SuggestionSet, SuggestionError> {
        let (vibecoder, prototyper) = tokio::join!(
            self.branch(SuggestionKind::Vibecoder, vibecoder_prompt(context)),
            self.branch(SuggestionKind::Prototyper, prototyper_prompt(context)),
        );
        let set = aggregate(vibecoder, prototyper)?;
        info!(
            "Generated {} suggestion(s){}",
            set.suggestions.len(),
            if set.is_partial() { " (partial)" } else { "" }
        );
        Ok(set)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::MemoryBackend;
    use async_trait::async_trait;

    /// Answers by prompt kind; `None` never answers
    struct ScriptedRunner {
        vibecoder: Option<Result<String, SuggestionError>>,
        prototyper: Option<Result<String, SuggestionError>>,
    }

    #[async_trait]
    impl AssistantRunner for ScriptedRunner {
        async fn run(&self, prompt: &str) -> Result<String, SuggestionError> {
            let answer = if prompt.contains("<message>") {
                &self.vibecoder
            } else {
                &self.prototyper
            };
            match answer {
                Some(result) => result.clone(),
                None => std::future::pending().await,
            }
        }
    }

    fn engine(runner: ScriptedRunner) -> SuggestionEngine {
        SuggestionEngine::new(Arc::new(runner), SuggestionConfig::default())
    }

    #[test]
    fn test_sanitize_vibecoder_tags() {
        let raw = "Sure! Here it is:\n<message>Make the button blue</message>\n";
        assert_eq!(
            sanitize_response(SuggestionKind::Vibecoder, raw),
            "Make the button blue"
        );
    }

    #[test]
    fn test_sanitize_fences_and_quotes() {
        let raw = "```text\n\"feat(ui): add dark mode\"\n```";
        assert_eq!(
            sanitize_response(SuggestionKind::Prototyper, raw),
            "feat(ui): add dark mode"
        );
        assert_eq!(
            sanitize_response(SuggestionKind::Prototyper, "'fix: typo'"),
            "fix: typo"
        );
        // Only one layer
        assert_eq!(
            sanitize_response(SuggestionKind::Prototyper, "\"'x'\""),
            "'x'"
        );
    }

    #[test]
    fn test_bound_diff() {
        assert_eq!(bound_diff("short", 10), "short");
        let bounded = bound_diff(&"x".repeat(20), 10);
        assert!(bounded.starts_with(&"x".repeat(10)));
        assert!(bounded.ends_with("[diff truncated]"));
    }

    #[test]
    fn test_aggregate_total_failure() {
        let err = aggregate(
            Err(SuggestionError::NotAuthenticated),
            Err(SuggestionError::Timeout(Duration::from_secs(30))),
        )
        .unwrap_err();
        assert!(matches!(err, SuggestionError::TotalFailure { .. }));
    }

    #[tokio::test]
    async fn test_both_succeed() {
        let set = engine(ScriptedRunner {
            vibecoder: Some(Ok("<message>Blue button</message>".into())),
            prototyper: Some(Ok("feat(ui): blue button".into())),
        })
        .generate(&SuggestionContext::default())
        .await
        .unwrap();

        assert_eq!(set.suggestions.len(), 2);
        assert_eq!(set.suggestions[0].kind, SuggestionKind::Vibecoder);
        assert_eq!(set.suggestions[0].message, "Blue button");
        assert!(!set.is_partial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prototyper_timeout_is_partial() {
        let set = engine(ScriptedRunner {
            vibecoder: Some(Ok("<message>Blue button</message>".into())),
            prototyper: None,
        })
        .generate(&SuggestionContext::default())
        .await
        .unwrap();

        assert_eq!(set.suggestions.len(), 1);
        assert_eq!(set.suggestions[0].message, "Blue button");
        assert!(matches!(
            set.partial,
            Some((SuggestionKind::Prototyper, SuggestionError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_empty_response_counts_as_failure() {
        let err = engine(ScriptedRunner {
            vibecoder: Some(Ok("<message>  </message>".into())),
            prototyper: Some(Err(SuggestionError::NotInstalled("claude".into()))),
        })
        .generate(&SuggestionContext::default())
        .await
        .unwrap_err();
        assert!(matches!(err, SuggestionError::TotalFailure { .. }));
    }

    #[tokio::test]
    async fn test_collect_context() {
        let backend = MemoryBackend::with_commits(&["a", "b", "c", "d", "e", "f"]);
        backend.make_dirty("src/ui.rs");
        let status = backend.status().await.unwrap();
        let checkpoints = backend.log().await.unwrap();

        let context = SuggestionContext::collect(
            &backend,
            &status,
            &checkpoints,
            Some("make it blue".into()),
            &SuggestionConfig::default(),
        )
        .await;

        assert!(context.diff.contains("src/ui.rs"));
        assert_eq!(context.modified, vec!["src/ui.rs"]);
        assert_eq!(context.recent_subjects, vec!["f", "e", "d", "c", "b"]);
        assert_eq!(context.latest_input.as_deref(), Some("make it blue"));
    }

    #[tokio::test]
    async fn test_collect_includes_new_file_content() {
        let backend = MemoryBackend::with_commits(&["a"]);
        backend.make_dirty("src/ui.rs");
        backend.make_untracked("src/theme.rs");
        let status = backend.status().await.unwrap();

        let context = SuggestionContext::collect(
            &backend,
            &status,
            &[],
            None,
            &SuggestionConfig::default(),
        )
        .await;

        assert!(context.diff.contains("diff --git a/src/ui.rs"));
        assert!(context.diff.contains("new file mode 100644\n+new content"));
        assert!(context.diff.contains("src/theme.rs"));
        assert_eq!(context.added, vec!["src/theme.rs"]);
    }

    #[tokio::test]
    async fn test_collect_stops_adding_new_files_past_bound() {
        let backend = MemoryBackend::new();
        backend.make_untracked("a.rs");
        backend.make_untracked("b.rs");
        let status = backend.status().await.unwrap();
        let config = SuggestionConfig {
            max_diff_chars: 10,
            ..SuggestionConfig::default()
        };

        let context = SuggestionContext::collect(&backend, &status, &[], None, &config).await;

        assert!(context.diff.contains("a.rs"));
        assert!(!context.diff.contains("b.rs"));
        assert!(context.diff.ends_with("[diff truncated]"));
    }
}
