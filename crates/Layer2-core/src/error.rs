//! Checkpoint error taxonomy
//!
//! Every failure the interactive loop can show to the user. Backend errors
//! are folded into [`CheckpointError::BackendCommandFailure`] except for a
//! missing repository, which gets its own variant so the loop can offer to
//! initialize one.

use std::path::PathBuf;
use thiserror::Error;

use crate::git::{CheckpointId, GitError};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Not a git repository: {0}")]
    RepositoryUnavailable(PathBuf),

    #[error("No checkpoints yet")]
    EmptyRepository,

    #[error("Another checkpoint operation is still running")]
    OperationInProgress,

    #[error("{0}")]
    BackendCommandFailure(String),

    #[error("There are no checkpoints to undo")]
    NoCheckpoints,

    #[error("Unknown checkpoint: {}", .0.short())]
    UnknownCheckpoint(CheckpointId),

    #[error("Checkpoint message is empty")]
    EmptyMessage,

    /// The list the user acted on no longer starts at the current HEAD
    #[error("The timeline changed since it was shown; try again")]
    TimelineChanged,
}

impl From<GitError> for CheckpointError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NotARepository(path) => CheckpointError::RepositoryUnavailable(path),
            other => CheckpointError::BackendCommandFailure(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckpointError>;
