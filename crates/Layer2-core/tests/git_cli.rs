//! Checkpoint controller against a real git repository
//!
//! `cargo test -p vibepoints-core --test git_cli`
//!
//! Skipped when `git` is not on PATH.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vibepoints_core::{
    checkpoints_lost_by_revert, CheckpointController, CheckpointError, CommitMessageConfig,
    CreateStrategy, GitOps, RepositoryObserver, VcsBackend,
};

fn git_available() -> bool {
    which::which("git").is_ok()
}

async fn git(dir: &Path, args: &[&str]) {
    let status = tokio::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .await
        .expect("git failed to start");
    assert!(status.success(), "git {:?} failed", args);
}

/// Fresh repository with a local identity
async fn repo() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    git(dir.path(), &["init", "-q"]).await;
    git(dir.path(), &["config", "user.email", "test@example.com"]).await;
    git(dir.path(), &["config", "user.name", "Test"]).await;
    git(dir.path(), &["config", "commit.gpgsign", "false"]).await;
    dir
}

fn controller(dir: &Path) -> (Arc<GitOps>, CheckpointController) {
    let backend = Arc::new(GitOps::new(dir));
    let observer = RepositoryObserver::new(backend.clone(), dir);
    (
        backend,
        CheckpointController::new(observer, CommitMessageConfig::default()),
    )
}

fn custom(label: &str) -> CreateStrategy {
    CreateStrategy::Custom {
        label: label.into(),
        description: String::new(),
    }
}

#[tokio::test]
async fn test_empty_repository_has_no_checkpoints() {
    if !git_available() {
        return;
    }
    let dir = repo().await;
    let (backend, _) = controller(dir.path());

    assert!(backend.is_repository().await);
    assert!(backend.log().await.unwrap().is_empty());
    assert!(backend.branch().await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_undo_revert_cycle() {
    if !git_available() {
        return;
    }
    let dir = repo().await;
    let (backend, controller) = controller(dir.path());

    for (i, label) in ["one", "two", "three"].iter().enumerate() {
        std::fs::write(dir.path().join(format!("file{}.txt", i)), label).unwrap();
        let outcome = controller.create(custom(label), true).await.unwrap();
        assert_eq!(outcome.snapshot.checkpoints, backend.log().await.unwrap());
    }

    let log = backend.log().await.unwrap();
    let subjects: Vec<_> = log.iter().map(|c| c.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Vibe: three", "Vibe: two", "Vibe: one"]);
    assert_eq!(log[0].changes.added, 1);

    let outcome = controller.undo(&log).await.unwrap();
    assert_eq!(outcome.snapshot.checkpoints.len(), 2);
    assert!(!dir.path().join("file2.txt").exists());

    let log = backend.log().await.unwrap();
    let target = log[1].id.clone();
    let lost = checkpoints_lost_by_revert(&log, &target).unwrap();
    assert_eq!(lost.len(), 1);

    let outcome = controller.revert(&log, &target).await.unwrap();
    assert_eq!(outcome.snapshot.checkpoints.len(), 1);
    assert_eq!(outcome.snapshot.checkpoints[0].subject, "Vibe: one");
}

#[tokio::test]
async fn test_manual_create_without_changes_fails() {
    if !git_available() {
        return;
    }
    let dir = repo().await;
    let (backend, controller) = controller(dir.path());
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    controller.create(custom("first"), false).await.unwrap();

    let err = controller.create(custom("again"), false).await.unwrap_err();
    assert!(matches!(err, CheckpointError::BackendCommandFailure(_)));
    assert_eq!(backend.log().await.unwrap().len(), 1);

    // Automatic checkpoints record even a clean tree
    let outcome = controller
        .create(CreateStrategy::Automatic("keep going".into()), false)
        .await
        .unwrap();
    assert_eq!(outcome.snapshot.checkpoints[0].subject, "[ ] keep going");
}

#[tokio::test]
async fn test_status_counts_untracked_and_modified() {
    if !git_available() {
        return;
    }
    let dir = repo().await;
    let (backend, controller) = controller(dir.path());
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    controller.create(custom("base"), false).await.unwrap();

    std::fs::write(dir.path().join("a.txt"), "changed").unwrap();
    std::fs::write(dir.path().join("b.txt"), "new").unwrap();
    let status = backend.status().await.unwrap();
    assert_eq!(status.uncommitted_count, 2);
    assert_eq!(status.changes.added, 1);
    assert_eq!(status.changes.modified, 1);
}

#[tokio::test]
async fn test_initialize_outside_repository() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let (backend, controller) = controller(dir.path());
    // A tempdir under an enclosing repository would still count as one
    if backend.is_repository().await {
        return;
    }

    controller.initialize().await.unwrap();
    assert!(backend.is_repository().await);
}

#[tokio::test]
async fn test_untracked_file_diff_leaves_index_alone() {
    if !git_available() {
        return;
    }
    let dir = repo().await;
    let (backend, controller) = controller(dir.path());
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    controller.create(custom("base"), false).await.unwrap();

    std::fs::write(dir.path().join("notes.md"), "brand new line\n").unwrap();
    let patch = backend
        .untracked_diff(Path::new("notes.md"))
        .await
        .unwrap();
    assert!(patch.contains("+brand new line"));

    let status = backend.status().await.unwrap();
    assert_eq!(status.changes.added, 1);
    assert!(backend
        .diff(vibepoints_core::DiffTarget::Staged)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_undo_refuses_after_commit_made_elsewhere() {
    if !git_available() {
        return;
    }
    let dir = repo().await;
    let (backend, controller) = controller(dir.path());
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    controller.create(custom("first"), false).await.unwrap();
    std::fs::write(dir.path().join("a.txt"), "b").unwrap();
    let shown = controller
        .create(custom("second"), false)
        .await
        .unwrap()
        .snapshot
        .checkpoints;

    std::fs::write(dir.path().join("a.txt"), "c").unwrap();
    git(dir.path(), &["commit", "-q", "-am", "outside"]).await;

    let err = controller.undo(&shown).await.unwrap_err();
    assert!(matches!(err, CheckpointError::TimelineChanged));
    assert_eq!(backend.log().await.unwrap()[0].subject, "outside");
}
