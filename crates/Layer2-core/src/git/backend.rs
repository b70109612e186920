//! Version-control backend interface
//!
//! Everything the checkpoint controller needs from the repository, behind
//! one async trait so the controller and observer can run against the git
//! CLI or an in-memory double.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::checkpoint::{Checkpoint, CheckpointId, FileChangeSummary};
use super::ops::GitError;

// ============================================================================
// Status Types
// ============================================================================

/// Status of a single working-tree entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Staged new file
    Added,
    /// Not yet tracked
    Untracked,
    /// Modified (staged or not)
    Modified,
    /// Deleted
    Removed,
    /// Renamed or copied
    Renamed,
    /// Unmerged path
    Conflicted,
}

impl FileStatus {
    /// Map a porcelain v1 `XY` pair
    pub fn from_porcelain(index: char, worktree: char) -> Self {
        match (index, worktree) {
            ('?', '?') => FileStatus::Untracked,
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => FileStatus::Conflicted,
            ('A', _) => FileStatus::Added,
            ('D', _) | (_, 'D') => FileStatus::Removed,
            ('R', _) | ('C', _) => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }
}

/// One uncommitted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Working-tree status snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStatus {
    /// Current branch name (`None` when detached or unknown)
    pub branch: Option<String>,

    /// HEAD does not point at a branch
    pub is_detached: bool,

    /// Unmerged paths exist
    pub has_conflicts: bool,

    /// Uncommitted changes grouped by kind
    pub changes: FileChangeSummary,

    /// Number of uncommitted paths
    pub uncommitted_count: usize,

    /// Individual uncommitted paths
    pub files: Vec<FileEntry>,
}

impl RepositoryStatus {
    /// Build a status from individual entries
    pub fn from_entries(branch: Option<String>, is_detached: bool, files: Vec<FileEntry>) -> Self {
        let mut changes = FileChangeSummary::default();
        let mut has_conflicts = false;
        for entry in &files {
            match entry.status {
                FileStatus::Added | FileStatus::Untracked => changes.added += 1,
                FileStatus::Removed => changes.removed += 1,
                FileStatus::Modified | FileStatus::Renamed => changes.modified += 1,
                FileStatus::Conflicted => {
                    has_conflicts = true;
                    changes.modified += 1;
                }
            }
        }
        Self {
            branch,
            is_detached,
            has_conflicts,
            changes,
            uncommitted_count: files.len(),
            files,
        }
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.uncommitted_count > 0
    }

    /// Paths grouped as (added, modified, removed)
    pub fn categorized_paths(&self) -> (Vec<String>, Vec<String>, Vec<String>) {
        let mut added = Vec::new();
        let mut modified = Vec::new();
        let mut removed = Vec::new();
        for entry in &self.files {
            let path = entry.path.display().to_string();
            match entry.status {
                FileStatus::Added | FileStatus::Untracked => added.push(path),
                FileStatus::Removed => removed.push(path),
                _ => modified.push(path),
            }
        }
        (added, modified, removed)
    }
}

/// What a diff is taken against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTarget {
    /// Working tree against HEAD
    WorkingTree,
    /// Index against HEAD (works before the first commit)
    Staged,
}

// ============================================================================
// Backend Trait
// ============================================================================

/// Repository operations consumed by the checkpoint controller
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Whether the working directory is inside a repository
    async fn is_repository(&self) -> bool;

    /// Full log, newest-first; empty when there are no commits yet
    async fn log(&self) -> Result<Vec<Checkpoint>, GitError>;

    /// Working-tree status
    async fn status(&self) -> Result<RepositoryStatus, GitError>;

    /// Patch text
    async fn diff(&self, target: DiffTarget) -> Result<String, GitError>;

    /// `--stat` style summary
    async fn diff_summary(&self, target: DiffTarget) -> Result<String, GitError>;

    /// Whole content of an untracked file as an addition patch
    async fn untracked_diff(&self, path: &Path) -> Result<String, GitError>;

    /// Stage every change, including untracked and deleted files
    async fn add_all(&self) -> Result<(), GitError>;

    /// Commit the index, returning the new revision
    async fn commit(&self, message: &str, allow_empty: bool) -> Result<CheckpointId, GitError>;

    /// Hard reset HEAD, index and working tree to `target`
    async fn reset_hard(&self, target: &CheckpointId) -> Result<(), GitError>;

    /// Current branch, `None` when detached
    async fn branch(&self) -> Result<Option<String>, GitError>;

    /// Create a repository in the working directory
    async fn init(&self) -> Result<(), GitError>;
}
