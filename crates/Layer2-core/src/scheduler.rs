//! Auto-checkpoint Scheduler
//!
//! Pure state machine deciding when an automatic checkpoint is taken. It
//! owns no timers of its own: the event loop feeds it the current instant,
//! sleeps until [`AutoCheckpointScheduler::next_deadline`] and executes the
//! returned [`SchedulerAction`]s.
//!
//! Idle -> Debouncing -> Committing -> Flashing -> Cooldown -> Idle

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Quiet time after the latest input before committing
    pub debounce: Duration,
    /// Minimum spacing between automatic commits
    pub min_interval: Duration,
    /// Highlight pulse after a commit
    pub flash: Duration,
    /// Rest period after the pulse
    pub cooldown: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1500),
            min_interval: Duration::from_secs(3),
            flash: Duration::from_millis(600),
            cooldown: Duration::from_millis(2400),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPhase {
    Idle,
    Debouncing,
    Committing,
    Flashing,
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Debounce,
    MinInterval,
    Flash,
    Cooldown,
}

/// One deadline slot per timer purpose; setting a slot replaces it
#[derive(Debug, Clone, Default)]
pub struct NamedTimers {
    debounce: Option<Instant>,
    min_interval: Option<Instant>,
    flash: Option<Instant>,
    cooldown: Option<Instant>,
}

impl NamedTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<Instant> {
        match kind {
            TimerKind::Debounce => &mut self.debounce,
            TimerKind::MinInterval => &mut self.min_interval,
            TimerKind::Flash => &mut self.flash,
            TimerKind::Cooldown => &mut self.cooldown,
        }
    }

    pub fn set(&mut self, kind: TimerKind, at: Instant) {
        *self.slot(kind) = Some(at);
    }

    pub fn clear(&mut self, kind: TimerKind) {
        *self.slot(kind) = None;
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, kind: TimerKind) -> Option<Instant> {
        match kind {
            TimerKind::Debounce => self.debounce,
            TimerKind::MinInterval => self.min_interval,
            TimerKind::Flash => self.flash,
            TimerKind::Cooldown => self.cooldown,
        }
    }

    /// Slot is set and has passed
    pub fn expired(&self, kind: TimerKind, now: Instant) -> bool {
        self.get(kind).is_some_and(|at| at <= now)
    }

    /// Earliest armed deadline
    pub fn next(&self) -> Option<Instant> {
        [self.debounce, self.min_interval, self.flash, self.cooldown]
            .into_iter()
            .flatten()
            .min()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerAction {
    /// Take an automatic checkpoint for this input
    Commit(String),
    /// The post-commit highlight is over
    FlashEnded,
}

/// How the loop's automatic create call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoCommitResult {
    Succeeded,
    /// Another repository operation held the guard
    Busy,
    Failed,
}

#[derive(Debug)]
pub struct AutoCheckpointScheduler {
    config: SchedulerConfig,
    enabled: bool,
    phase: AutoPhase,
    timers: NamedTimers,
    /// Latest unprocessed input and when it arrived
    pending: Option<(String, Instant)>,
    last_processed_text: Option<String>,
    last_auto_commit_at: Option<Instant>,
    /// Debounce elapsed while a manual creation flow was open
    held: bool,
    /// Text being committed and the value `last_processed_text` had before
    in_flight: Option<(String, Option<String>)>,
}

impl AutoCheckpointScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            enabled: false,
            phase: AutoPhase::Idle,
            timers: NamedTimers::default(),
            pending: None,
            last_processed_text: None,
            last_auto_commit_at: None,
            held: false,
            in_flight: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> AutoPhase {
        self.phase
    }

    pub fn is_flashing(&self) -> bool {
        self.phase == AutoPhase::Flashing
    }

    pub fn last_processed_text(&self) -> Option<&str> {
        self.last_processed_text.as_deref()
    }

    pub fn pending_text(&self) -> Option<&str> {
        self.pending.as_ref().map(|(text, _)| text.as_str())
    }

    /// Turn the feature on. The current latest input counts as processed,
    /// so enabling never commits retroactively.
    pub fn enable(&mut self, latest: Option<&str>) {
        self.enabled = true;
        self.last_processed_text = latest.map(str::to_string);
        self.pending = None;
        self.held = false;
        if self.phase != AutoPhase::Committing {
            self.timers.clear_all();
            self.phase = AutoPhase::Idle;
        }
        debug!("Auto-checkpoint enabled");
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.pending = None;
        self.held = false;
        if self.phase != AutoPhase::Committing {
            self.timers.clear_all();
            self.phase = AutoPhase::Idle;
        }
        debug!("Auto-checkpoint disabled");
    }

    /// A (possibly unchanged) latest input was observed
    pub fn on_input(&mut self, text: &str, now: Instant) {
        if !self.enabled || self.last_processed_text.as_deref() == Some(text) {
            return;
        }
        if self.pending_text() == Some(text) {
            return;
        }

        self.pending = Some((text.to_string(), now));
        match self.phase {
            AutoPhase::Idle | AutoPhase::Debouncing => {
                self.phase = AutoPhase::Debouncing;
                self.held = false;
                self.timers.clear(TimerKind::MinInterval);
                self.timers
                    .set(TimerKind::Debounce, now + self.config.debounce);
            }
            // Deferred until the current cycle settles
            AutoPhase::Committing | AutoPhase::Flashing | AutoPhase::Cooldown => {}
        }
    }

    /// Advance expired timers. `manual_active` holds a due commit while the
    /// user is in a manual creation flow.
    pub fn on_tick(&mut self, now: Instant, manual_active: bool) -> Vec<SchedulerAction> {
        let mut actions = Vec::new();

        loop {
            match self.phase {
                AutoPhase::Flashing if self.timers.expired(TimerKind::Flash, now) => {
                    let ended = self.timers.get(TimerKind::Flash).unwrap_or(now);
                    self.timers.clear(TimerKind::Flash);
                    self.timers
                        .set(TimerKind::Cooldown, ended + self.config.cooldown);
                    self.phase = AutoPhase::Cooldown;
                    actions.push(SchedulerAction::FlashEnded);
                }
                AutoPhase::Cooldown if self.timers.expired(TimerKind::Cooldown, now) => {
                    let ended = self.timers.get(TimerKind::Cooldown).unwrap_or(now);
                    self.timers.clear(TimerKind::Cooldown);
                    self.resume_pending(ended);
                }
                AutoPhase::Debouncing
                    if self.held
                        || self.timers.expired(TimerKind::Debounce, now)
                        || self.timers.expired(TimerKind::MinInterval, now) =>
                {
                    self.timers.clear(TimerKind::Debounce);
                    self.timers.clear(TimerKind::MinInterval);

                    if manual_active {
                        self.held = true;
                        break;
                    }
                    self.held = false;

                    if let Some(last) = self.last_auto_commit_at {
                        let earliest = last + self.config.min_interval;
                        if now < earliest {
                            self.timers.set(TimerKind::MinInterval, earliest);
                            break;
                        }
                    }

                    match self.pending.take() {
                        Some((text, _)) => {
                            let previous = self.last_processed_text.replace(text.clone());
                            self.in_flight = Some((text.clone(), previous));
                            self.phase = AutoPhase::Committing;
                            actions.push(SchedulerAction::Commit(text));
                        }
                        None => self.phase = AutoPhase::Idle,
                    }
                }
                _ => break,
            }
        }

        actions
    }

    /// Re-enter debouncing for deferred input, or go idle
    fn resume_pending(&mut self, now: Instant) {
        let resumable = match &self.pending {
            Some((text, _)) => self.last_processed_text.as_deref() != Some(text.as_str()),
            None => false,
        };
        match (&self.pending, resumable) {
            (Some((_, since)), true) => {
                let due = (*since + self.config.debounce).max(now);
                self.timers.set(TimerKind::Debounce, due);
                self.phase = AutoPhase::Debouncing;
            }
            _ => {
                self.pending = None;
                self.phase = AutoPhase::Idle;
            }
        }
    }

    /// Report the outcome of a [`SchedulerAction::Commit`]
    pub fn on_commit_finished(&mut self, result: AutoCommitResult, now: Instant) {
        let in_flight = self.in_flight.take();
        if !self.enabled {
            self.timers.clear_all();
            self.phase = AutoPhase::Idle;
            return;
        }

        match result {
            AutoCommitResult::Succeeded => {
                self.last_auto_commit_at = Some(now);
                self.timers.set(TimerKind::Flash, now + self.config.flash);
                self.phase = AutoPhase::Flashing;
            }
            AutoCommitResult::Busy => {
                if let Some((text, previous)) = in_flight {
                    self.last_processed_text = previous;
                    if self.pending.is_none() {
                        self.pending = Some((text, now));
                    }
                }
                self.timers
                    .set(TimerKind::Debounce, now + self.config.debounce);
                self.phase = AutoPhase::Debouncing;
            }
            AutoCommitResult::Failed => {
                self.resume_pending(now);
            }
        }
    }

    /// Next instant the loop must call [`Self::on_tick`]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn enabled() -> AutoCheckpointScheduler {
        let mut scheduler = AutoCheckpointScheduler::new(SchedulerConfig::default());
        scheduler.enable(None);
        scheduler
    }

    /// Drive ticks at every deadline up to `until`, collecting commits
    fn run_until(
        scheduler: &mut AutoCheckpointScheduler,
        until: Instant,
        result: AutoCommitResult,
    ) -> Vec<String> {
        let mut commits = Vec::new();
        while let Some(deadline) = scheduler.next_deadline() {
            if deadline > until {
                break;
            }
            for action in scheduler.on_tick(deadline, false) {
                if let SchedulerAction::Commit(text) = action {
                    commits.push(text);
                    scheduler.on_commit_finished(result, deadline);
                }
            }
        }
        commits
    }

    #[test]
    fn test_two_inputs_one_second_apart_commit_once() {
        let t0 = Instant::now();
        let mut scheduler = enabled();

        scheduler.on_input("first", t0);
        assert!(scheduler.on_tick(t0 + ms(1000), false).is_empty());
        scheduler.on_input("second", t0 + ms(1000));

        let commits = run_until(&mut scheduler, t0 + ms(10_000), AutoCommitResult::Succeeded);
        assert_eq!(commits, vec!["second"]);
        assert_eq!(scheduler.last_processed_text(), Some("second"));
        assert_eq!(scheduler.phase(), AutoPhase::Idle);
    }

    #[test]
    fn test_debounce_fires_after_quiet_period() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("blue", t0);

        assert!(scheduler.on_tick(t0 + ms(1499), false).is_empty());
        assert_eq!(
            scheduler.on_tick(t0 + ms(1500), false),
            vec![SchedulerAction::Commit("blue".into())]
        );
        assert_eq!(scheduler.phase(), AutoPhase::Committing);
        assert_eq!(scheduler.last_processed_text(), Some("blue"));
    }

    #[test]
    fn test_same_text_does_not_restart_debounce() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("blue", t0);
        scheduler.on_input("blue", t0 + ms(1000));
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(1500)));
    }

    #[test]
    fn test_enable_marks_latest_processed() {
        let t0 = Instant::now();
        let mut scheduler = AutoCheckpointScheduler::new(SchedulerConfig::default());
        scheduler.on_input("ignored while disabled", t0);
        assert_eq!(scheduler.phase(), AutoPhase::Idle);

        scheduler.enable(Some("already here"));
        scheduler.on_input("already here", t0);
        assert_eq!(scheduler.phase(), AutoPhase::Idle);
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn test_flash_then_cooldown_then_idle() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("blue", t0);
        scheduler.on_tick(t0 + ms(1500), false);
        scheduler.on_commit_finished(AutoCommitResult::Succeeded, t0 + ms(1600));

        assert!(scheduler.is_flashing());
        assert_eq!(
            scheduler.on_tick(t0 + ms(2200), false),
            vec![SchedulerAction::FlashEnded]
        );
        assert_eq!(scheduler.phase(), AutoPhase::Cooldown);
        scheduler.on_tick(t0 + ms(4599), false);
        assert_eq!(scheduler.phase(), AutoPhase::Cooldown);
        scheduler.on_tick(t0 + ms(4600), false);
        assert_eq!(scheduler.phase(), AutoPhase::Idle);
    }

    #[test]
    fn test_input_during_cooldown_is_deferred_not_dropped() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("one", t0);
        scheduler.on_tick(t0 + ms(1500), false);
        scheduler.on_commit_finished(AutoCommitResult::Succeeded, t0 + ms(1500));
        scheduler.on_tick(t0 + ms(2100), false);

        scheduler.on_input("two", t0 + ms(2500));
        assert_eq!(scheduler.phase(), AutoPhase::Cooldown);

        // Cooldown ends at 4500, debounce for "two" would end at 4000
        let actions = scheduler.on_tick(t0 + ms(4500), false);
        assert_eq!(actions, vec![SchedulerAction::Commit("two".into())]);
    }

    #[test]
    fn test_min_interval_defers() {
        let t0 = Instant::now();
        let config = SchedulerConfig {
            debounce: ms(100),
            min_interval: ms(3000),
            flash: ms(100),
            cooldown: ms(100),
        };
        let mut scheduler = AutoCheckpointScheduler::new(config);
        scheduler.enable(None);

        scheduler.on_input("one", t0);
        scheduler.on_tick(t0 + ms(100), false);
        scheduler.on_commit_finished(AutoCommitResult::Succeeded, t0 + ms(100));
        scheduler.on_tick(t0 + ms(300), false);
        assert_eq!(scheduler.phase(), AutoPhase::Idle);

        scheduler.on_input("two", t0 + ms(400));
        assert!(scheduler.on_tick(t0 + ms(500), false).is_empty());
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(3100)));
        assert_eq!(
            scheduler.on_tick(t0 + ms(3100), false),
            vec![SchedulerAction::Commit("two".into())]
        );
    }

    #[test]
    fn test_manual_flow_holds_commit() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("blue", t0);

        assert!(scheduler.on_tick(t0 + ms(1500), true).is_empty());
        assert!(scheduler.next_deadline().is_none());
        assert_eq!(scheduler.phase(), AutoPhase::Debouncing);

        assert_eq!(
            scheduler.on_tick(t0 + ms(9000), false),
            vec![SchedulerAction::Commit("blue".into())]
        );
    }

    #[test]
    fn test_busy_restores_and_retries() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("blue", t0);
        scheduler.on_tick(t0 + ms(1500), false);
        scheduler.on_commit_finished(AutoCommitResult::Busy, t0 + ms(1600));

        assert_eq!(scheduler.last_processed_text(), None);
        assert_eq!(scheduler.phase(), AutoPhase::Debouncing);
        assert_eq!(
            scheduler.on_tick(t0 + ms(3100), false),
            vec![SchedulerAction::Commit("blue".into())]
        );
    }

    #[test]
    fn test_failure_goes_idle_without_retry() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("blue", t0);
        scheduler.on_tick(t0 + ms(1500), false);
        scheduler.on_commit_finished(AutoCommitResult::Failed, t0 + ms(1600));

        assert_eq!(scheduler.phase(), AutoPhase::Idle);
        assert!(scheduler.next_deadline().is_none());
        scheduler.on_input("blue", t0 + ms(2000));
        assert_eq!(scheduler.phase(), AutoPhase::Idle);
    }

    #[test]
    fn test_input_during_commit_fires_after_failure() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("one", t0);
        assert_eq!(
            scheduler.on_tick(t0 + ms(1500), false),
            vec![SchedulerAction::Commit("one".into())]
        );

        scheduler.on_input("two", t0 + ms(1550));
        assert_eq!(scheduler.phase(), AutoPhase::Committing);
        assert_eq!(scheduler.pending_text(), Some("two"));

        scheduler.on_commit_finished(AutoCommitResult::Failed, t0 + ms(1600));
        assert_eq!(scheduler.phase(), AutoPhase::Debouncing);
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(3050)));
        assert_eq!(
            scheduler.on_tick(t0 + ms(3050), false),
            vec![SchedulerAction::Commit("two".into())]
        );
    }

    #[test]
    fn test_input_during_commit_survives_busy() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("one", t0);
        scheduler.on_tick(t0 + ms(1500), false);
        scheduler.on_input("two", t0 + ms(1550));

        scheduler.on_commit_finished(AutoCommitResult::Busy, t0 + ms(1600));
        assert_eq!(
            scheduler.on_tick(t0 + ms(3100), false),
            vec![SchedulerAction::Commit("two".into())]
        );
    }

    #[test]
    fn test_disable_cancels_pending() {
        let t0 = Instant::now();
        let mut scheduler = enabled();
        scheduler.on_input("blue", t0);
        scheduler.disable();
        assert!(scheduler.next_deadline().is_none());
        assert!(scheduler.on_tick(t0 + ms(5000), false).is_empty());
    }

    #[test]
    fn test_named_timers_replace_slot() {
        let t0 = Instant::now();
        let mut timers = NamedTimers::default();
        timers.set(TimerKind::Debounce, t0 + ms(500));
        timers.set(TimerKind::Debounce, t0 + ms(900));
        timers.set(TimerKind::Cooldown, t0 + ms(700));
        assert_eq!(timers.next(), Some(t0 + ms(700)));
        timers.clear(TimerKind::Cooldown);
        assert_eq!(timers.next(), Some(t0 + ms(900)));
        assert!(!timers.expired(TimerKind::Debounce, t0 + ms(899)));
        assert!(timers.expired(TimerKind::Debounce, t0 + ms(900)));
    }
}
