//! Checkpoint Controller
//!
//! The only code path that mutates the repository. Create, undo, revert
//! and init are serialized by a single in-flight flag: a second call while
//! one is running fails with [`CheckpointError::OperationInProgress`]
//! instead of queueing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use vibepoints_foundation::strings::is_blank;

use crate::conversation::ConversationInput;
use crate::error::{CheckpointError, Result};
use crate::git::{
    checkpoints_lost_by_revert, Checkpoint, CheckpointId, CommitMessageConfig, VcsBackend,
};
use crate::observer::{RepositoryObserver, RepositorySnapshot};

/// How the message of a new checkpoint is produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateStrategy {
    /// Latest conversation input verbatim
    LastInput(Option<ConversationInput>),
    /// User-entered label and optional description
    Custom { label: String, description: String },
    /// A suggestion chosen by the user
    AiAssisted(String),
    /// Scheduler-triggered checkpoint for this input text
    Automatic(String),
}

impl CreateStrategy {
    fn name(&self) -> &'static str {
        match self {
            CreateStrategy::LastInput(_) => "last-input",
            CreateStrategy::Custom { .. } => "custom",
            CreateStrategy::AiAssisted(_) => "ai-assisted",
            CreateStrategy::Automatic(_) => "automatic",
        }
    }
}

/// Result of a successful mutation
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub snapshot: RepositorySnapshot,
    /// Checkpoint to highlight briefly
    pub highlight: Option<CheckpointId>,
}

/// Clears the in-flight flag on every exit path
struct OperationGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct CheckpointController {
    backend: Arc<dyn VcsBackend>,
    observer: RepositoryObserver,
    in_flight: Arc<AtomicBool>,
    messages: CommitMessageConfig,
}

impl CheckpointController {
    pub fn new(observer: RepositoryObserver, messages: CommitMessageConfig) -> Self {
        Self {
            backend: observer.backend().clone(),
            observer,
            in_flight: Arc::new(AtomicBool::new(false)),
            messages,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<OperationGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CheckpointError::OperationInProgress)?;
        Ok(OperationGuard {
            flag: self.in_flight.clone(),
        })
    }

    /// Fail unless the backend's newest checkpoint is still the one the
    /// caller's list starts with
    async fn ensure_current(&self, checkpoints: &[Checkpoint]) -> Result<()> {
        let log = self.backend.log().await?;
        let shown = checkpoints.first().map(|c| &c.id);
        let actual = log.first().map(|c| &c.id);
        if shown != actual {
            debug!("Timeline moved: shown {:?}, actual {:?}", shown, actual);
            return Err(CheckpointError::TimelineChanged);
        }
        Ok(())
    }

    async fn compose(&self, strategy: &CreateStrategy, prefix_enabled: bool) -> Result<String> {
        match strategy {
            CreateStrategy::LastInput(input) => Ok(self
                .messages
                .last_input_message(input.as_ref().map(|i| i.text.as_str()))),
            CreateStrategy::Custom { label, description } => {
                if is_blank(label) {
                    return Err(CheckpointError::EmptyMessage);
                }
                Ok(self
                    .messages
                    .custom_message(label, description, prefix_enabled))
            }
            CreateStrategy::AiAssisted(message) => {
                if is_blank(message) {
                    return Err(CheckpointError::EmptyMessage);
                }
                Ok(message.clone())
            }
            CreateStrategy::Automatic(text) => {
                let has_changes = self.backend.status().await?.has_uncommitted_changes();
                Ok(self.messages.auto_message(text, has_changes))
            }
        }
    }

    /// Stage everything and commit with the strategy's message
    pub async fn create(
        &self,
        strategy: CreateStrategy,
        prefix_enabled: bool,
    ) -> Result<MutationOutcome> {
        let _guard = self.acquire()?;
        let message = self.compose(&strategy, prefix_enabled).await?;
        let allow_empty = matches!(strategy, CreateStrategy::Automatic(_));

        self.backend.add_all().await?;
        let id = self.backend.commit(&message, allow_empty).await?;
        info!("Created {} checkpoint {}", strategy.name(), id.short());

        let snapshot = self.observer.refresh().await?;
        Ok(MutationOutcome {
            snapshot,
            highlight: Some(id),
        })
    }

    /// Reset to the parent of the newest checkpoint
    pub async fn undo(&self, checkpoints: &[Checkpoint]) -> Result<MutationOutcome> {
        let newest = checkpoints.first().ok_or(CheckpointError::NoCheckpoints)?;
        let parent = newest.parent.clone().ok_or_else(|| {
            CheckpointError::BackendCommandFailure(
                "The first checkpoint has nothing before it to undo to".to_string(),
            )
        })?;

        let _guard = self.acquire()?;
        self.ensure_current(checkpoints).await?;
        self.backend.reset_hard(&parent).await?;
        info!("Undid checkpoint {}", newest.id.short());

        let snapshot = self.observer.refresh().await?;
        Ok(MutationOutcome {
            snapshot,
            highlight: Some(parent),
        })
    }

    /// Reset to `target`, discarding every newer checkpoint
    pub async fn revert(
        &self,
        checkpoints: &[Checkpoint],
        target: &CheckpointId,
    ) -> Result<MutationOutcome> {
        let lost = checkpoints_lost_by_revert(checkpoints, target)?;

        let _guard = self.acquire()?;
        self.ensure_current(checkpoints).await?;
        self.backend.reset_hard(target).await?;
        info!(
            "Reverted to {} ({} checkpoints discarded)",
            target.short(),
            lost.len()
        );

        let snapshot = self.observer.refresh().await?;
        Ok(MutationOutcome {
            snapshot,
            highlight: Some(target.clone()),
        })
    }

    /// Create a repository in the working directory
    pub async fn initialize(&self) -> Result<MutationOutcome> {
        let _guard = self.acquire()?;
        self.backend.init().await?;
        debug!("Repository initialized");
        let snapshot = self.observer.refresh().await?;
        Ok(MutationOutcome {
            snapshot,
            highlight: None,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::MemoryBackend;
    use tokio::sync::Notify;

    fn controller(backend: &MemoryBackend) -> CheckpointController {
        let observer = RepositoryObserver::new(Arc::new(backend.clone()), "/work");
        CheckpointController::new(observer, CommitMessageConfig::default())
    }

    fn ids(checkpoints: &[Checkpoint]) -> Vec<String> {
        checkpoints.iter().map(|c| c.id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_creates_match_backend_log() {
        let backend = MemoryBackend::new();
        let controller = controller(&backend);

        for label in ["one", "two", "three"] {
            backend.make_dirty("src/lib.rs");
            let outcome = controller
                .create(
                    CreateStrategy::Custom {
                        label: label.into(),
                        description: String::new(),
                    },
                    true,
                )
                .await
                .unwrap();
            assert_eq!(outcome.snapshot.checkpoints, backend.commits());
            assert_eq!(
                outcome.highlight.as_ref(),
                Some(&outcome.snapshot.checkpoints[0].id)
            );
        }

        let subjects: Vec<_> = backend.commits().iter().map(|c| c.subject.clone()).collect();
        assert_eq!(subjects, vec!["Vibe: three", "Vibe: two", "Vibe: one"]);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_undo_empty_list_touches_nothing() {
        let backend = MemoryBackend::new();
        let err = controller(&backend).undo(&[]).await.unwrap_err();
        assert!(matches!(err, CheckpointError::NoCheckpoints));
        assert!(backend.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_undo_resets_to_parent() {
        let backend = MemoryBackend::with_commits(&["c1", "c2"]);
        let controller = controller(&backend);
        let outcome = controller.undo(&backend.commits()).await.unwrap();
        assert_eq!(ids(&outcome.snapshot.checkpoints), vec!["c1"]);
        assert_eq!(backend.mutations(), vec!["reset:c1"]);
    }

    #[tokio::test]
    async fn test_undo_root_fails_without_mutation() {
        let backend = MemoryBackend::with_commits(&["only"]);
        let err = controller(&backend)
            .undo(&backend.commits())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::BackendCommandFailure(_)));
        assert!(backend.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_revert_drops_newer_checkpoints() {
        let backend = MemoryBackend::with_commits(&["C1", "C2", "C3"]);
        let controller = controller(&backend);
        let before = backend.commits();
        let target = CheckpointId::from_string("c2");

        let lost = checkpoints_lost_by_revert(&before, &target).unwrap();
        assert_eq!(ids(&lost), vec!["c3"]);

        let outcome = controller.revert(&before, &target).await.unwrap();
        assert_eq!(ids(&outcome.snapshot.checkpoints), vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn test_undo_with_outdated_list_keeps_newer_checkpoint() {
        let backend = MemoryBackend::with_commits(&["c1", "c2"]);
        let controller = controller(&backend);
        let shown = backend.commits();
        backend.push_commit("made elsewhere");

        let err = controller.undo(&shown).await.unwrap_err();
        assert!(matches!(err, CheckpointError::TimelineChanged));
        assert!(backend.mutations().is_empty());
        assert_eq!(ids(&backend.commits()), vec!["c3", "c2", "c1"]);
        assert!(!controller.is_busy());

        let outcome = controller.undo(&backend.commits()).await.unwrap();
        assert_eq!(ids(&outcome.snapshot.checkpoints), vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn test_revert_with_outdated_list_fails() {
        let backend = MemoryBackend::with_commits(&["c1", "c2"]);
        let controller = controller(&backend);
        let shown = backend.commits();
        backend.push_commit("made elsewhere");

        let err = controller
            .revert(&shown, &CheckpointId::from_string("c1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::TimelineChanged));
        assert_eq!(backend.commits().len(), 3);
    }

    #[tokio::test]
    async fn test_revert_unknown_target() {
        let backend = MemoryBackend::with_commits(&["C1"]);
        let err = controller(&backend)
            .revert(&backend.commits(), &CheckpointId::from_string("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::UnknownCheckpoint(_)));
        assert!(backend.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_ai_assisted_commits_exact_message() {
        let backend = MemoryBackend::new();
        backend.make_dirty("src/ui.rs");
        controller(&backend)
            .create(
                CreateStrategy::AiAssisted("Make the button blue".into()),
                true,
            )
            .await
            .unwrap();
        assert_eq!(backend.commit_messages(), vec!["Make the button blue"]);
    }

    #[tokio::test]
    async fn test_last_input_fallback_message() {
        let backend = MemoryBackend::new();
        backend.make_dirty("a.txt");
        controller(&backend)
            .create(CreateStrategy::LastInput(None), true)
            .await
            .unwrap();
        assert_eq!(backend.commit_messages(), vec!["Checkpoint"]);
    }

    #[tokio::test]
    async fn test_automatic_allows_empty_and_marks_clean() {
        let backend = MemoryBackend::with_commits(&["base"]);
        controller(&backend)
            .create(CreateStrategy::Automatic("make it blue".into()), true)
            .await
            .unwrap();
        assert_eq!(backend.commit_messages(), vec!["[ ] make it blue"]);
    }

    #[tokio::test]
    async fn test_manual_with_nothing_to_commit_fails() {
        let backend = MemoryBackend::with_commits(&["base"]);
        let controller = controller(&backend);
        let before = backend.commits();
        let err = controller
            .create(CreateStrategy::AiAssisted("msg".into()), true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No changes to commit");
        assert_eq!(backend.commits(), before);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_failed_commit_releases_guard() {
        let backend = MemoryBackend::new();
        backend.make_dirty("a.txt");
        backend.fail_commit_with(Some("fatal: unable to write"));
        let controller = controller(&backend);

        let err = controller
            .create(CreateStrategy::LastInput(None), true)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::BackendCommandFailure(_)));
        assert!(backend.commits().is_empty());

        backend.fail_commit_with(None);
        assert!(controller
            .create(CreateStrategy::LastInput(None), true)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_reentrant_call_fails_immediately() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let backend = MemoryBackend::new().gated(entered.clone(), release.clone());
        backend.make_dirty("a.txt");
        let controller = controller(&backend);

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .create(CreateStrategy::LastInput(None), true)
                    .await
            })
        };
        entered.notified().await;
        assert!(controller.is_busy());

        let err = controller
            .undo(&backend.commits())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::NoCheckpoints));

        let err = controller
            .create(CreateStrategy::AiAssisted("second".into()), true)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::OperationInProgress));

        release.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert!(!controller.is_busy());
        assert_eq!(backend.commit_messages(), vec!["Checkpoint"]);
    }

    #[tokio::test]
    async fn test_initialize() {
        let backend = MemoryBackend::not_a_repository();
        let outcome = controller(&backend).initialize().await.unwrap();
        assert!(outcome.snapshot.checkpoints.is_empty());
        assert_eq!(backend.mutations(), vec!["init"]);
    }
}
