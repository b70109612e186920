//! vibepoints-core: checkpoint runtime
//!
//! Layer2 - everything between the terminal UI and the outside world
//!
//! # Modules
//!
//! - `git`: backend trait, git CLI implementation, checkpoint types
//! - `observer`: repository log/status reads with last-good fallback
//! - `controller`: serialized create / undo / revert / init
//! - `scheduler`: automatic checkpoint state machine
//! - `conversation`: latest user input from the assistant's logs
//! - `suggestion`: concurrent message suggestions from the assistant
//! - `watch`: filesystem notifications and the coalescing dispatcher
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vibepoints_core::{CheckpointController, CommitMessageConfig, CreateStrategy, GitOps, RepositoryObserver};
//!
//! let observer = RepositoryObserver::new(Arc::new(GitOps::new(".")), ".");
//! let controller = CheckpointController::new(observer, CommitMessageConfig::default());
//! let outcome = controller
//!     .create(CreateStrategy::Custom { label: "fix bug".into(), description: String::new() }, true)
//!     .await?;
//! ```

pub mod controller;
pub mod conversation;
pub mod error;
pub mod git;
pub mod observer;
pub mod scheduler;
pub mod suggestion;
pub mod watch;

// Re-exports: Errors
pub use error::{CheckpointError, Result};

// Re-exports: Git
pub use git::{
    checkpoints_lost_by_revert, Checkpoint, CheckpointId, CommitMessageConfig, DiffTarget,
    FileChangeSummary, FileEntry, FileStatus, GitError, GitOps, RepositoryStatus, VcsBackend,
};

// Re-exports: Repository state
pub use observer::{RepositoryObserver, RepositorySnapshot, RepositoryState};

// Re-exports: Controller
pub use controller::{CheckpointController, CreateStrategy, MutationOutcome};

// Re-exports: Scheduler
pub use scheduler::{
    AutoCheckpointScheduler, AutoCommitResult, AutoPhase, SchedulerAction, SchedulerConfig,
};

// Re-exports: Conversation
pub use conversation::{ConversationHistory, ConversationInput, ConversationSource};

// Re-exports: Suggestions
pub use suggestion::{
    AssistantRunner, ClaudeCli, Suggestion, SuggestionConfig, SuggestionContext, SuggestionEngine,
    SuggestionError, SuggestionKind, SuggestionSet, TASK_PROMPT_MARKER,
};

// Re-exports: Watching
pub use watch::{spawn_coalescer, ChangeBatch, ChangeSource, ChangeWatcher, COALESCE_WINDOW};
