//! Checkpoint Types
//!
//! A checkpoint is a read-only projection of one commit in the repository
//! log. The list handed around the application is always newest-first,
//! exactly as `git log` reports it.

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};

use crate::error::{CheckpointError, Result};

// ============================================================================
// Checkpoint Types
// ============================================================================

/// Backend revision identifier (full commit hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointId(pub String);

impl CheckpointId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counts of added / modified / removed files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeSummary {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
}

impl FileChangeSummary {
    pub fn new(added: usize, modified: usize, removed: usize) -> Self {
        Self {
            added,
            modified,
            removed,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Record one `git log --name-status` letter
    pub fn record_name_status(&mut self, letter: char) {
        match letter {
            'A' => self.added += 1,
            'D' => self.removed += 1,
            _ => self.modified += 1,
        }
    }
}

impl std::fmt::Display for FileChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "+{} ~{} -{}", self.added, self.modified, self.removed)
    }
}

/// One entry of the checkpoint timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Commit hash
    pub id: CheckpointId,

    /// First parent, `None` for a root commit
    pub parent: Option<CheckpointId>,

    /// First line of the commit message
    pub subject: String,

    /// Remaining message lines (may be empty)
    pub body: String,

    /// Author timestamp
    pub composed_at: DateTime<FixedOffset>,

    /// Files touched by the commit
    pub changes: FileChangeSummary,
}

impl Checkpoint {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        composed_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: CheckpointId::from_string(id),
            parent: None,
            subject: subject.into(),
            body: String::new(),
            composed_at,
            changes: FileChangeSummary::default(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(CheckpointId::from_string(parent));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_changes(mut self, changes: FileChangeSummary) -> Self {
        self.changes = changes;
        self
    }

    /// Full commit message (subject, blank line, body)
    pub fn message(&self) -> String {
        if self.body.is_empty() {
            self.subject.clone()
        } else {
            format!("{}\n\n{}", self.subject, self.body)
        }
    }

    /// "Jan 5, 2025 at 3:04 PM" in local time
    pub fn display_timestamp(&self) -> String {
        self.composed_at
            .with_timezone(&Local)
            .format("%b %-d, %Y at %-I:%M %p")
            .to_string()
    }
}

/// The checkpoints a revert to `target` destroys: every entry strictly
/// newer than `target`, newest-first.
pub fn checkpoints_lost_by_revert(
    checkpoints: &[Checkpoint],
    target: &CheckpointId,
) -> Result<Vec<Checkpoint>> {
    let position = checkpoints
        .iter()
        .position(|c| &c.id == target)
        .ok_or_else(|| CheckpointError::UnknownCheckpoint(target.clone()))?;
    Ok(checkpoints[..position].to_vec())
}

// ============================================================================
// Tests
// ============================================================================
