//! In-memory [`VcsBackend`] used by controller, observer and suggestion tests

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Notify;

use super::backend::{DiffTarget, FileEntry, FileStatus, RepositoryStatus, VcsBackend};
use super::checkpoint::{Checkpoint, CheckpointId};
use super::ops::GitError;

#[derive(Debug, Default)]
struct State {
    is_repo: bool,
    commits: Vec<Checkpoint>,
    dirty: Vec<FileEntry>,
    staged: bool,
    next_id: usize,
    fail_log: Option<String>,
    fail_commit: Option<String>,
    mutations: Vec<String>,
    commit_messages: Vec<String>,
}

/// Shared in-memory repository
#[derive(Clone, Default)]
pub(crate) struct MemoryBackend {
    state: Arc<Mutex<State>>,
    /// When set, `commit` signals `entered` and waits for `release`
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().is_repo = true;
        backend
    }

    pub fn not_a_repository() -> Self {
        Self::default()
    }

    /// Repository with the given subjects committed oldest-first
    pub fn with_commits(subjects: &[&str]) -> Self {
        let backend = Self::new();
        for subject in subjects {
            backend.push_commit(subject);
        }
        backend
    }

    /// Block commits until `release` is notified; `entered` fires when a
    /// commit starts waiting
    pub fn gated(self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..self
        }
    }

    /// Commit directly, as another tool would
    pub fn push_commit(&self, message: &str) -> CheckpointId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = format!("c{}", state.next_id);
        let at = FixedOffset::east_opt(0)
            .and_then(|tz| tz.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).single())
            .map(|t| t + chrono::Duration::minutes(state.next_id as i64))
            .expect("valid fixture time");

        let (subject, body) = match message.split_once("\n\n") {
            Some((s, b)) => (s.to_string(), b.to_string()),
            None => (message.to_string(), String::new()),
        };
        let mut checkpoint = Checkpoint::new(id.clone(), subject, at).with_body(body);
        if let Some(head) = state.commits.first() {
            checkpoint.parent = Some(head.id.clone());
        }
        state.commits.insert(0, checkpoint);
        CheckpointId::from_string(id)
    }

    pub fn make_dirty(&self, path: &str) {
        self.state.lock().dirty.push(FileEntry {
            path: PathBuf::from(path),
            status: FileStatus::Modified,
        });
    }

    pub fn make_untracked(&self, path: &str) {
        self.state.lock().dirty.push(FileEntry {
            path: PathBuf::from(path),
            status: FileStatus::Untracked,
        });
    }

    pub fn fail_log_with(&self, message: Option<&str>) {
        self.state.lock().fail_log = message.map(String::from);
    }

    pub fn fail_commit_with(&self, message: Option<&str>) {
        self.state.lock().fail_commit = message.map(String::from);
    }

    /// Mutating calls in order ("add", "commit", "reset:<id>", "init")
    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().mutations.clone()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.state.lock().commit_messages.clone()
    }

    pub fn commits(&self) -> Vec<Checkpoint> {
        self.state.lock().commits.clone()
    }
}

#[async_trait]
impl VcsBackend for MemoryBackend {
    async fn is_repository(&self) -> bool {
        self.state.lock().is_repo
    }

    async fn log(&self) -> Result<Vec<Checkpoint>, GitError> {
        let state = self.state.lock();
        if let Some(message) = &state.fail_log {
            return Err(GitError::CommandFailed(message.clone()));
        }
        Ok(state.commits.clone())
    }

    async fn status(&self) -> Result<RepositoryStatus, GitError> {
        let state = self.state.lock();
        Ok(RepositoryStatus::from_entries(
            Some("main".to_string()),
            false,
            state.dirty.clone(),
        ))
    }

    async fn diff(&self, _target: DiffTarget) -> Result<String, GitError> {
        let state = self.state.lock();
        Ok(state
            .dirty
            .iter()
            .filter(|f| f.status != FileStatus::Untracked)
            .map(|f| format!("diff --git a/{0} b/{0}\n+change\n", f.path.display()))
            .collect())
    }

    async fn diff_summary(&self, _target: DiffTarget) -> Result<String, GitError> {
        let state = self.state.lock();
        Ok(format!("{} files changed", state.dirty.len()))
    }

    async fn untracked_diff(&self, path: &Path) -> Result<String, GitError> {
        let state = self.state.lock();
        let untracked = state
            .dirty
            .iter()
            .any(|f| f.path == path && f.status == FileStatus::Untracked);
        Ok(if untracked {
            format!("diff --git a/{0} b/{0}\nnew file mode 100644\n+new content\n", path.display())
        } else {
            String::new()
        })
    }

    async fn add_all(&self) -> Result<(), GitError> {
        let mut state = self.state.lock();
        state.mutations.push("add".to_string());
        state.staged = !state.dirty.is_empty();
        Ok(())
    }

    async fn commit(&self, message: &str, allow_empty: bool) -> Result<CheckpointId, GitError> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }

        {
            let mut state = self.state.lock();
            state.mutations.push("commit".to_string());
            if let Some(failure) = &state.fail_commit {
                return Err(GitError::CommandFailed(failure.clone()));
            }
            if !state.staged && !allow_empty {
                return Err(GitError::NothingToCommit);
            }
            state.staged = false;
            state.dirty.clear();
            state.commit_messages.push(message.to_string());
        }
        Ok(self.push_commit(message))
    }

    async fn reset_hard(&self, target: &CheckpointId) -> Result<(), GitError> {
        let mut state = self.state.lock();
        state.mutations.push(format!("reset:{}", target));
        let position = state
            .commits
            .iter()
            .position(|c| &c.id == target)
            .ok_or_else(|| GitError::CommandFailed(format!("unknown revision {}", target)))?;
        state.commits.drain(..position);
        state.dirty.clear();
        state.staged = false;
        Ok(())
    }

    async fn branch(&self) -> Result<Option<String>, GitError> {
        Ok(Some("main".to_string()))
    }

    async fn init(&self) -> Result<(), GitError> {
        let mut state = self.state.lock();
        state.mutations.push("init".to_string());
        state.is_repo = true;
        Ok(())
    }
}
