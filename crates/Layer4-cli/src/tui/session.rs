//! Session state behind the timeline
//!
//! What the loop knows about the repository and the conversation, updated
//! only from task completions. No I/O happens here: the loop spawns the
//! work this state asks for and feeds the results back in.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use vibepoints_core::{
    AutoCheckpointScheduler, AutoCommitResult, CheckpointError, CheckpointId, ConversationInput,
    MutationOutcome, RepositorySnapshot, RepositoryState, SchedulerAction, SchedulerConfig,
};

/// Who started a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Manual,
    Automatic,
}

/// Row shown with the highlight style until `until`
#[derive(Debug, Clone)]
pub struct Highlight {
    pub id: CheckpointId,
    pub until: Instant,
}

/// Issued with every refresh; a result whose ticket predates the latest
/// mutation describes a timeline that no longer exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

pub struct Session {
    pub repo: RepositoryState,
    pub latest_input: Option<ConversationInput>,
    latest_loaded: bool,
    pub scheduler: AutoCheckpointScheduler,
    flash: Duration,
    refresh_in_flight: bool,
    refresh_again: bool,
    /// Bumped on every finished mutation
    epoch: u64,
    pub highlight: Option<Highlight>,
    /// Automatic checkpoint failures, cleared on the next key press
    pub notice: Option<String>,
}

impl Session {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            repo: RepositoryState::default(),
            latest_input: None,
            latest_loaded: false,
            flash: config.flash,
            scheduler: AutoCheckpointScheduler::new(config),
            refresh_in_flight: false,
            refresh_again: false,
            epoch: 0,
            highlight: None,
            notice: None,
        }
    }

    // ========================================================================
    // Refresh bookkeeping
    // ========================================================================

    /// Start a refresh unless one is running; a request made meanwhile is
    /// folded into a single follow-up
    pub fn request_refresh(&mut self) -> Option<RefreshTicket> {
        if self.refresh_in_flight {
            self.refresh_again = true;
            return None;
        }
        self.refresh_in_flight = true;
        Some(RefreshTicket(self.epoch))
    }

    /// Apply a refresh result. Returns `Some(changed)` when the list was
    /// replaced, `changed` telling whether the newest checkpoint or the
    /// length moved.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<RepositorySnapshot, CheckpointError>,
    ) -> Option<bool> {
        self.refresh_in_flight = false;
        if ticket.0 != self.epoch {
            debug!("Dropping refresh started before the last mutation");
            self.refresh_again = true;
            return None;
        }
        self.apply_snapshot(result)
    }

    /// Ticket for the follow-up refresh owed by [`Self::request_refresh`]
    pub fn follow_up_refresh(&mut self) -> Option<RefreshTicket> {
        if std::mem::take(&mut self.refresh_again) {
            self.request_refresh()
        } else {
            None
        }
    }

    fn apply_snapshot(&mut self, result: Result<RepositorySnapshot, CheckpointError>) -> Option<bool> {
        let previous_newest = self.repo.latest().map(|c| c.id.clone());
        let previous_len = self.repo.checkpoints.len();
        if !self.repo.apply_refresh(result) {
            return None;
        }
        let newest = self.repo.latest().map(|c| &c.id);
        Some(newest != previous_newest.as_ref() || self.repo.checkpoints.len() != previous_len)
    }

    // ========================================================================
    // Completions
    // ========================================================================

    /// Record a finished create, undo, revert or init. Returns the list
    /// change as [`Self::finish_refresh`] does.
    pub fn finish_mutation(
        &mut self,
        origin: Origin,
        result: &Result<MutationOutcome, CheckpointError>,
        now: Instant,
    ) -> Option<bool> {
        self.epoch += 1;

        let changed = match result {
            Ok(outcome) => {
                self.highlight = outcome.highlight.clone().map(|id| Highlight {
                    id,
                    until: now + self.flash,
                });
                self.apply_snapshot(Ok(outcome.snapshot.clone()))
            }
            Err(_) => None,
        };

        if origin == Origin::Automatic {
            let finished = match result {
                Ok(_) => AutoCommitResult::Succeeded,
                Err(CheckpointError::OperationInProgress) => AutoCommitResult::Busy,
                Err(e) => {
                    warn!("Automatic checkpoint failed: {}", e);
                    self.notice = Some(format!("Automatic checkpoint failed: {}", e));
                    AutoCommitResult::Failed
                }
            };
            self.scheduler.on_commit_finished(finished, now);
        }
        changed
    }

    /// A freshly read latest input. The first read only arms the scheduler
    /// so starting up never commits retroactively.
    pub fn apply_latest_input(
        &mut self,
        input: Option<ConversationInput>,
        auto_enabled: bool,
        now: Instant,
    ) {
        let first = !std::mem::replace(&mut self.latest_loaded, true);
        self.latest_input = input;
        let text = self.latest_input.as_ref().map(|i| i.text.as_str());

        if first {
            if auto_enabled {
                self.scheduler.enable(text);
            }
            return;
        }
        if let Some(text) = text {
            self.scheduler.on_input(text, now);
        }
    }

    pub fn set_auto_checkpoint(&mut self, enabled: bool) {
        if enabled {
            let latest = self.latest_input.as_ref().map(|i| i.text.as_str());
            self.scheduler.enable(latest);
        } else {
            self.scheduler.disable();
        }
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Advance the scheduler, returning the texts to commit automatically
    pub fn tick(&mut self, now: Instant, manual_active: bool) -> Vec<String> {
        let mut commits = Vec::new();
        for action in self.scheduler.on_tick(now, manual_active) {
            match action {
                SchedulerAction::Commit(text) => commits.push(text),
                SchedulerAction::FlashEnded => self.highlight = None,
            }
        }
        commits
    }

    pub fn expire_highlight(&mut self, now: Instant) {
        if self.highlight.as_ref().is_some_and(|h| h.until <= now) {
            self.highlight = None;
        }
    }

    pub fn highlight_deadline(&self) -> Option<Instant> {
        self.highlight.as_ref().map(|h| h.until)
    }
}
