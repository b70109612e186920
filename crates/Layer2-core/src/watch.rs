//! Change watching
//!
//! Filesystem notifications for the two external sources (repository
//! metadata and the conversation log directory) are classified at the
//! source and funnelled through one coalescing dispatcher, so a burst of
//! writes produces a single [`ChangeBatch`] per quiet period.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Quiet period before a batch is dispatched
pub const COALESCE_WINDOW: Duration = Duration::from_millis(250);

/// Which source a change belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Repository,
    Conversation,
}

/// Sources touched during one quiet period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub repository: bool,
    pub conversation: bool,
}

impl ChangeBatch {
    fn record(&mut self, source: ChangeSource) {
        match source {
            ChangeSource::Repository => self.repository = true,
            ChangeSource::Conversation => self.conversation = true,
        }
    }
}

/// Metadata paths whose change means the log or HEAD moved. The index and
/// lock files are excluded: `git status` rewrites them.
fn is_repository_change(git_dir: &Path, path: &Path) -> bool {
    if path.extension().is_some_and(|ext| ext == "lock") {
        return false;
    }
    let Ok(relative) = path.strip_prefix(git_dir) else {
        return false;
    };
    match relative.components().next() {
        Some(first) => matches!(
            first.as_os_str().to_str(),
            Some("HEAD" | "ORIG_HEAD" | "logs" | "refs" | "packed-refs")
        ),
        None => false,
    }
}

/// A `.jsonl` file directly inside `target`, or the creation of `target`
/// itself or one of its missing parents
fn is_conversation_change(target: &Path, path: &Path) -> bool {
    if path.parent() == Some(target) {
        return path.extension().is_some_and(|ext| ext == "jsonl");
    }
    target.starts_with(path)
}

/// `dir` itself when it exists, else its closest existing ancestor
fn closest_existing(dir: &Path) -> Option<PathBuf> {
    dir.ancestors().find(|p| p.is_dir()).map(Path::to_path_buf)
}

// ============================================================================
// Watcher
// ============================================================================

/// Conversation directory and the directory actually watched for it. Until
/// the conversation directory exists its closest existing ancestor is
/// watched instead.
struct ConversationWatch {
    target: PathBuf,
    watching: Option<PathBuf>,
}

/// Keeps the OS watches alive; dropping it stops notifications
pub struct ChangeWatcher {
    watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
    conversation: Option<ConversationWatch>,
}

impl ChangeWatcher {
    /// Watch `git_dir` recursively and `conversation_dir` flat. A missing
    /// git directory is skipped; a missing conversation directory is
    /// waited for through its closest existing ancestor (see [`Self::rearm`]).
    pub fn start(
        git_dir: Option<PathBuf>,
        conversation_dir: Option<PathBuf>,
        tx: mpsc::UnboundedSender<ChangeSource>,
    ) -> Result<Self, notify::Error> {
        let repo_root = git_dir.clone();
        let conversation_target = conversation_dir.clone();
        let watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    for path in &event.paths {
                        let source = match (&repo_root, &conversation_target) {
                            (Some(root), _) if is_repository_change(root, path) => {
                                ChangeSource::Repository
                            }
                            (_, Some(target)) if is_conversation_change(target, path) => {
                                ChangeSource::Conversation
                            }
                            _ => continue,
                        };
                        // Receiver gone means the loop is shutting down
                        let _ = tx.send(source);
                    }
                }
                Err(e) => warn!("Watch error: {}", e),
            },
            Config::default(),
        )?;

        let mut this = Self {
            watcher,
            watched: Vec::new(),
            conversation: conversation_dir.map(|target| ConversationWatch {
                target,
                watching: None,
            }),
        };

        match git_dir {
            Some(dir) if dir.is_dir() => {
                this.watch(dir, RecursiveMode::Recursive);
            }
            Some(dir) => debug!("Directory does not exist, skipping: {}", dir.display()),
            None => {}
        }
        this.rearm();

        info!("Change watcher started for {} directories", this.watched.len());
        Ok(this)
    }

    fn watch(&mut self, dir: PathBuf, mode: RecursiveMode) -> bool {
        match self.watcher.watch(&dir, mode) {
            Ok(()) => {
                self.watched.push(dir);
                true
            }
            Err(e) => {
                warn!("Failed to watch {}: {}", dir.display(), e);
                false
            }
        }
    }

    fn unwatch(&mut self, dir: &Path) {
        if let Err(e) = self.watcher.unwatch(dir) {
            debug!("Failed to unwatch {}: {}", dir.display(), e);
        }
        self.watched.retain(|p| p != dir);
    }

    /// Move the conversation watch to the closest existing directory on the
    /// way to the conversation directory. Call after a conversation change;
    /// returns whether the directory itself is now watched.
    pub fn rearm(&mut self) -> bool {
        let Some(conversation) = &self.conversation else {
            return false;
        };
        let target = conversation.target.clone();
        let current = conversation.watching.clone();
        let closest = closest_existing(&target);
        if closest.is_none() || closest == current {
            return current.as_deref() == Some(target.as_path());
        }

        if let Some(old) = &current {
            self.unwatch(old);
        }
        let watching = closest.filter(|dir| self.watch(dir.clone(), RecursiveMode::NonRecursive));
        match &watching {
            Some(dir) if dir == &target => info!("Watching conversation logs in {}", dir.display()),
            Some(dir) => debug!(
                "Waiting for {} through {}",
                target.display(),
                dir.display()
            ),
            None => {}
        }
        if let Some(conversation) = &mut self.conversation {
            conversation.watching = watching;
        }
        self.watches_conversation()
    }

    /// The conversation directory itself is being watched
    pub fn watches_conversation(&self) -> bool {
        self.conversation
            .as_ref()
            .is_some_and(|c| c.watching.as_deref() == Some(c.target.as_path()))
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

// ============================================================================
// Coalescing dispatcher
// ============================================================================

/// Merge raw changes into batches. A batch is sent once no new change has
/// arrived for `window`. Returns when either channel closes.
pub async fn coalesce(
    mut rx: mpsc::UnboundedReceiver<ChangeSource>,
    tx: mpsc::UnboundedSender<ChangeBatch>,
    window: Duration,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = ChangeBatch::default();
        batch.record(first);

        let mut closed = false;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(source) => batch.record(source),
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = tokio::time::sleep(window) => break,
            }
        }

        debug!("Dispatching change batch: {:?}", batch);
        if tx.send(batch).is_err() || closed {
            return;
        }
    }
}

pub fn spawn_coalescer(
    rx: mpsc::UnboundedReceiver<ChangeSource>,
    tx: mpsc::UnboundedSender<ChangeBatch>,
) -> JoinHandle<()> {
    tokio::spawn(coalesce(rx, tx, COALESCE_WINDOW))
}
