//! Git Integration Module
//!
//! The repository behind the checkpoint timeline:
//! - `backend`: the [`VcsBackend`] trait and status types
//! - `ops`: [`GitOps`], the git CLI implementation
//! - `checkpoint`: checkpoint projection of the log
//! - `commit`: message composition for each creation strategy

pub mod backend;
pub mod checkpoint;
pub mod commit;
pub mod ops;

#[cfg(test)]
pub(crate) mod memory;

pub use backend::{DiffTarget, FileEntry, FileStatus, RepositoryStatus, VcsBackend};
pub use checkpoint::{checkpoints_lost_by_revert, Checkpoint, CheckpointId, FileChangeSummary};
pub use commit::CommitMessageConfig;
pub use ops::{GitError, GitOps};
