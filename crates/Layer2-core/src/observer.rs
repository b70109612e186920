//! Repository Observer
//!
//! Reads the checkpoint list and working-tree status from the backend and
//! keeps the last good view when a reload fails.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{CheckpointError, Result};
use crate::git::{Checkpoint, RepositoryStatus, VcsBackend};

/// Log and status read together
#[derive(Debug, Clone, Default)]
pub struct RepositorySnapshot {
    pub checkpoints: Vec<Checkpoint>,
    pub status: RepositoryStatus,
}

#[derive(Clone)]
pub struct RepositoryObserver {
    backend: Arc<dyn VcsBackend>,
    workdir: std::path::PathBuf,
}

impl RepositoryObserver {
    pub fn new(backend: Arc<dyn VcsBackend>, workdir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            backend,
            workdir: workdir.into(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn VcsBackend> {
        &self.backend
    }

    /// `RepositoryUnavailable` unless the working directory is a work tree
    pub async fn check(&self) -> Result<()> {
        if self.backend.is_repository().await {
            Ok(())
        } else {
            Err(CheckpointError::RepositoryUnavailable(self.workdir.clone()))
        }
    }

    /// Reload log and status
    pub async fn refresh(&self) -> Result<RepositorySnapshot> {
        let (checkpoints, status) = tokio::try_join!(self.backend.log(), self.backend.status())?;
        debug!("Refreshed {} checkpoints", checkpoints.len());
        Ok(RepositorySnapshot {
            checkpoints,
            status,
        })
    }

    pub async fn status(&self) -> Result<RepositoryStatus> {
        Ok(self.backend.status().await?)
    }
}

// ============================================================================
// Displayed state
// ============================================================================

/// What the main screen shows about the repository
#[derive(Debug, Clone, Default)]
pub struct RepositoryState {
    pub checkpoints: Vec<Checkpoint>,
    pub status: RepositoryStatus,
    /// Last refresh failure, shown while the previous list stays visible
    pub banner: Option<String>,
    loaded: bool,
}

impl RepositoryState {
    /// Apply a refresh result. Returns true when the list was replaced.
    pub fn apply_refresh(&mut self, result: Result<RepositorySnapshot>) -> bool {
        match result {
            Ok(snapshot) => {
                self.checkpoints = snapshot.checkpoints;
                self.status = snapshot.status;
                self.banner = None;
                self.loaded = true;
                true
            }
            Err(e) => {
                warn!("Repository refresh failed: {}", e);
                self.banner = Some(e.to_string());
                false
            }
        }
    }

    pub fn apply_status(&mut self, result: Result<RepositoryStatus>) {
        match result {
            Ok(status) => self.status = status,
            Err(e) => debug!("Status poll failed: {}", e),
        }
    }

    /// Informational notice for a repository with no commits yet
    pub fn empty_notice(&self) -> Option<CheckpointError> {
        (self.loaded && self.checkpoints.is_empty()).then_some(CheckpointError::EmptyRepository)
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.checkpoints.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::MemoryBackend;

    fn observer(backend: &MemoryBackend) -> RepositoryObserver {
        RepositoryObserver::new(Arc::new(backend.clone()), "/work")
    }

    #[tokio::test]
    async fn test_check_unavailable() {
        let backend = MemoryBackend::not_a_repository();
        let err = observer(&backend).check().await.unwrap_err();
        assert!(matches!(err, CheckpointError::RepositoryUnavailable(_)));
    }

    #[tokio::test]
    async fn test_refresh_newest_first() {
        let backend = MemoryBackend::with_commits(&["one", "two"]);
        backend.make_dirty("src/lib.rs");
        let snapshot = observer(&backend).refresh().await.unwrap();
        assert_eq!(snapshot.checkpoints[0].subject, "two");
        assert_eq!(snapshot.status.uncommitted_count, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good_list() {
        let backend = MemoryBackend::with_commits(&["one"]);
        let observer = observer(&backend);
        let mut state = RepositoryState::default();
        assert!(state.apply_refresh(observer.refresh().await));

        backend.fail_log_with(Some("fatal: corrupt"));
        assert!(!state.apply_refresh(observer.refresh().await));
        assert_eq!(state.checkpoints.len(), 1);
        assert!(state.banner.as_deref().unwrap().contains("corrupt"));

        backend.fail_log_with(None);
        state.apply_refresh(observer.refresh().await);
        assert!(state.banner.is_none());
    }

    #[tokio::test]
    async fn test_empty_repository_is_a_notice() {
        let backend = MemoryBackend::new();
        let mut state = RepositoryState::default();
        assert!(state.empty_notice().is_none());
        state.apply_refresh(observer(&backend).refresh().await);
        assert!(state.banner.is_none());
        assert!(matches!(
            state.empty_notice(),
            Some(CheckpointError::EmptyRepository)
        ));
    }
}
