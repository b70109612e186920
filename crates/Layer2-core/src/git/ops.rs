//! Git Operations
//!
//! [`VcsBackend`] implemented on top of the `git` command line.

use async_trait::async_trait;
use chrono::DateTime;
use std::path::{Path, PathBuf};
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use super::backend::{DiffTarget, FileEntry, FileStatus, RepositoryStatus, VcsBackend};
use super::checkpoint::{Checkpoint, CheckpointId, FileChangeSummary};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("No changes to commit")]
    NothingToCommit,

    #[error("Unexpected git output: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Field separator inside one log record
const FIELD_SEP: char = '\u{1f}';
/// Record separator between log entries
const RECORD_SEP: char = '\u{1e}';

/// Log format: hash, parents, author date, subject, body, then name-status lines
const LOG_FORMAT: &str = "--format=%x1e%H%x1f%P%x1f%aI%x1f%s%x1f%b%x1f";

// ============================================================================
// Git Operations
// ============================================================================

/// Git CLI backend rooted at a working directory
#[derive(Debug, Clone)]
pub struct GitOps {
    /// Working directory the tool was started in
    workdir: PathBuf,
}

impl GitOps {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Find the git repository root
    pub fn find_git_root(path: &Path) -> Result<PathBuf, GitError> {
        let mut current = if path.is_file() {
            path.parent().unwrap_or(path).to_path_buf()
        } else {
            path.to_path_buf()
        };

        loop {
            if current.join(".git").exists() {
                return Ok(current);
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                return Err(GitError::NotARepository(path.to_path_buf()));
            }
        }
    }

    /// Repository metadata directory, when it is a plain directory
    pub fn git_dir(&self) -> Option<PathBuf> {
        let root = Self::find_git_root(&self.workdir).ok()?;
        let dir = root.join(".git");
        dir.is_dir().then_some(dir)
    }

    async fn output(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(output)
    }

    /// Run a git command, returning untrimmed stdout
    async fn run_git_raw(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(GitError::CommandFailed(failure_text(&output)))
        }
    }

    /// Run a git command
    async fn run_git(&self, args: &[&str]) -> Result<String, GitError> {
        self.run_git_raw(args).await.map(|s| s.trim().to_string())
    }
}

fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}

/// `git log` fails this way before the first commit
fn is_unborn_head_error(message: &str) -> bool {
    message.contains("does not have any commits yet")
        || message.contains("bad default revision")
        || message.contains("unknown revision or path not in the working tree")
}

/// Parse output produced with [`LOG_FORMAT`] and `--name-status`
pub(crate) fn parse_log(output: &str) -> Result<Vec<Checkpoint>, GitError> {
    let mut checkpoints = Vec::new();

    for record in output.split(RECORD_SEP).filter(|r| !r.trim().is_empty()) {
        let fields: Vec<&str> = record.splitn(6, FIELD_SEP).collect();
        if fields.len() < 5 {
            return Err(GitError::Parse(format!(
                "log record with {} fields",
                fields.len()
            )));
        }

        let composed_at = DateTime::parse_from_rfc3339(fields[2].trim())
            .map_err(|e| GitError::Parse(format!("bad date '{}': {}", fields[2], e)))?;

        let mut changes = FileChangeSummary::default();
        if let Some(tail) = fields.get(5) {
            for line in tail.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if let Some(letter) = line.chars().next() {
                    changes.record_name_status(letter);
                }
            }
        }

        let mut checkpoint = Checkpoint::new(fields[0].trim(), fields[3], composed_at)
            .with_body(fields[4].trim())
            .with_changes(changes);
        if let Some(parent) = fields[1].split_whitespace().next() {
            checkpoint = checkpoint.with_parent(parent);
        }
        checkpoints.push(checkpoint);
    }

    Ok(checkpoints)
}

/// Parse `git status --porcelain=v1` entries
pub(crate) fn parse_porcelain(output: &str) -> Vec<FileEntry> {
    output
        .lines()
        .filter(|line| line.len() >= 4)
        .map(|line| {
            let mut chars = line.chars();
            let index = chars.next().unwrap_or(' ');
            let worktree = chars.next().unwrap_or(' ');
            let raw_path = &line[3..];
            // Renames are reported as "old -> new"
            let path = raw_path
                .rsplit(" -> ")
                .next()
                .unwrap_or(raw_path)
                .trim_matches('"');
            FileEntry {
                path: PathBuf::from(path),
                status: FileStatus::from_porcelain(index, worktree),
            }
        })
        .collect()
}

#[async_trait]
impl VcsBackend for GitOps {
    async fn is_repository(&self) -> bool {
        Self::find_git_root(&self.workdir).is_ok()
    }

    async fn log(&self) -> Result<Vec<Checkpoint>, GitError> {
        match self
            .run_git_raw(&["log", LOG_FORMAT, "--name-status", "--no-renames"])
            .await
        {
            Ok(output) => parse_log(&output),
            Err(GitError::CommandFailed(message)) if is_unborn_head_error(&message) => {
                debug!("Repository has no commits yet");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn status(&self) -> Result<RepositoryStatus, GitError> {
        let branch = self.branch().await?;
        let output = self
            .run_git_raw(&["status", "--porcelain=v1", "--untracked-files=all"])
            .await?;
        let is_detached = branch.is_none();
        Ok(RepositoryStatus::from_entries(
            branch,
            is_detached,
            parse_porcelain(&output),
        ))
    }

    async fn diff(&self, target: DiffTarget) -> Result<String, GitError> {
        match target {
            DiffTarget::WorkingTree => self.run_git(&["diff", "HEAD"]).await,
            DiffTarget::Staged => self.run_git(&["diff", "--cached"]).await,
        }
    }

    async fn diff_summary(&self, target: DiffTarget) -> Result<String, GitError> {
        match target {
            DiffTarget::WorkingTree => self.run_git(&["diff", "--stat", "HEAD"]).await,
            DiffTarget::Staged => self.run_git(&["diff", "--stat", "--cached"]).await,
        }
    }

    async fn untracked_diff(&self, path: &Path) -> Result<String, GitError> {
        let path = path.to_string_lossy();
        let output = self
            .output(&["diff", "--no-index", "--", "/dev/null", path.as_ref()])
            .await?;
        // Exit status 1 means the files differ
        match output.status.code() {
            Some(0) | Some(1) => Ok(String::from_utf8_lossy(&output.stdout).trim().to_string()),
            _ => Err(GitError::CommandFailed(failure_text(&output))),
        }
    }

    async fn add_all(&self) -> Result<(), GitError> {
        self.run_git(&["add", "-A"]).await?;
        Ok(())
    }

    async fn commit(&self, message: &str, allow_empty: bool) -> Result<CheckpointId, GitError> {
        let mut args = vec!["commit", "--no-verify", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }

        let output = self.output(&args).await?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !allow_empty && stdout.contains("nothing to commit") {
                return Err(GitError::NothingToCommit);
            }
            return Err(GitError::CommandFailed(failure_text(&output)));
        }

        let hash = self.run_git(&["rev-parse", "HEAD"]).await?;
        info!("Created commit: {}", hash);
        Ok(CheckpointId::from_string(hash))
    }

    async fn reset_hard(&self, target: &CheckpointId) -> Result<(), GitError> {
        self.run_git(&["reset", "--hard", target.as_str()]).await?;
        info!("Reset to {}", target.short());
        Ok(())
    }

    async fn branch(&self) -> Result<Option<String>, GitError> {
        // symbolic-ref works before the first commit, unlike rev-parse
        let output = self.output(&["symbolic-ref", "--quiet", "--short", "HEAD"]).await?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else if output.status.code() == Some(1) {
            Ok(None)
        } else {
            Err(GitError::CommandFailed(failure_text(&output)))
        }
    }

    async fn init(&self) -> Result<(), GitError> {
        self.run_git(&["init"]).await?;
        info!("Initialized repository in {}", self.workdir.display());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, parents: &str, subject: &str, body: &str, files: &str) -> String {
        format!(
            "\u{1e}{hash}\u{1f}{parents}\u{1f}2025-01-05T15:04:00+01:00\u{1f}{subject}\u{1f}{body}\u{1f}\n{files}"
        )
    }

    #[test]
    fn test_parse_log_newest_first() {
        let output = format!(
            "{}{}",
            record("bbb", "aaa", "second", "", "\nM\tsrc/lib.rs\nA\tsrc/new.rs\n"),
            record("aaa", "", "first", "line one\nline two\n", "\nA\tREADME.md\n"),
        );
        let log = parse_log(&output).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id.as_str(), "bbb");
        assert_eq!(log[0].parent.as_ref().unwrap().as_str(), "aaa");
        assert_eq!(log[0].changes, FileChangeSummary::new(1, 1, 0));
        assert_eq!(log[1].subject, "first");
        assert_eq!(log[1].body, "line one\nline two");
        assert!(log[1].parent.is_none());
    }

    #[test]
    fn test_parse_log_merge_takes_first_parent() {
        let output = record("ccc", "aaa bbb", "merge", "", "");
        let log = parse_log(&output).unwrap();
        assert_eq!(log[0].parent.as_ref().unwrap().as_str(), "aaa");
    }

    #[test]
    fn test_parse_log_empty() {
        assert!(parse_log("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_log_bad_date() {
        let output = "\u{1e}aaa\u{1f}\u{1f}yesterday\u{1f}s\u{1f}\u{1f}";
        assert!(matches!(parse_log(output), Err(GitError::Parse(_))));
    }

    #[test]
    fn test_parse_porcelain() {
        let output = " M src/lib.rs\n?? notes.txt\nR  old.rs -> new.rs\nD  gone.rs\n";
        let entries = parse_porcelain(output);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].status, FileStatus::Modified);
        assert_eq!(entries[1].status, FileStatus::Untracked);
        assert_eq!(entries[2].path, PathBuf::from("new.rs"));
        assert_eq!(entries[3].status, FileStatus::Removed);
    }

    #[test]
    fn test_unborn_head_detection() {
        assert!(is_unborn_head_error(
            "fatal: your current branch 'main' does not have any commits yet"
        ));
        assert!(!is_unborn_head_error("fatal: index file corrupt"));
    }

    #[test]
    fn test_find_git_root_missing() {
        assert!(GitOps::find_git_root(Path::new("/nonexistent/path/that/does/not/exist")).is_err());
    }
}
