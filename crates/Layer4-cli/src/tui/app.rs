//! Main TUI application
//!
//! One cooperative loop owns all UI state. Repository, conversation and
//! assistant calls run in spawned tasks and report back as [`AppEvent`]s;
//! their handlers are the only place the displayed list is replaced.

use crate::audio::{SilentPlayer, SoundCue, SoundPlayer, SystemPlayer};
use crate::tui::event::{EventHandler, TuiEvent};
use crate::tui::navigation::{Command, NavContext, Navigator, Screen};
use crate::tui::pages::{self, View};
use crate::tui::session::{Origin, RefreshTicket, Session};
use crate::tui::theme::Theme;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vibepoints_core::{
    spawn_coalescer, ChangeBatch, ChangeSource, ChangeWatcher, CheckpointController,
    CheckpointError, ClaudeCli, CommitMessageConfig, ConversationInput, ConversationSource,
    CreateStrategy, GitOps, MutationOutcome, RepositoryObserver, RepositorySnapshot,
    RepositoryStatus, SchedulerConfig, SuggestionConfig, SuggestionContext, SuggestionEngine,
    SuggestionError, SuggestionSet,
};
use vibepoints_foundation::{OptionKey, Options, OptionsStore};

const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);
const SPINNER_INTERVAL: Duration = Duration::from_millis(120);

/// Startup settings from the command line
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub workdir: PathBuf,
    pub assistant_command: String,
    pub conversation_dir: Option<PathBuf>,
    /// Use filesystem notifications; otherwise everything rides the poll
    pub watch: bool,
}

/// Completion of a spawned task
#[derive(Debug)]
enum AppEvent {
    Checked(Result<(), CheckpointError>),
    Refreshed(RefreshTicket, Result<RepositorySnapshot, CheckpointError>),
    Status(Result<RepositoryStatus, CheckpointError>),
    LatestInput(Option<ConversationInput>),
    Mutated {
        origin: Origin,
        result: Result<MutationOutcome, CheckpointError>,
    },
    Suggestions {
        request_id: u64,
        result: Result<SuggestionSet, SuggestionError>,
    },
}

/// Run the TUI application
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (app, app_rx, changes_rx) = App::new(config);
    let result = app.run(&mut terminal, app_rx, changes_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application state
struct App {
    config: AppConfig,
    theme: Theme,
    nav: Navigator,
    session: Session,
    options: Options,
    options_store: OptionsStore,
    observer: RepositoryObserver,
    controller: CheckpointController,
    git: GitOps,
    conversation: ConversationSource,
    suggestions: SuggestionEngine,
    audio: Box<dyn SoundPlayer>,
    tx: mpsc::UnboundedSender<AppEvent>,
    changes_tx: mpsc::UnboundedSender<ChangeSource>,
    watcher: Option<ChangeWatcher>,
    /// Repository check passed; polling and watching are live
    ready: bool,
    status_in_flight: bool,
    spinner: usize,
    should_quit: bool,
}

impl App {
    fn new(
        config: AppConfig,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<AppEvent>,
        mpsc::UnboundedReceiver<ChangeSource>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();

        let git = GitOps::new(&config.workdir);
        let observer = RepositoryObserver::new(Arc::new(git.clone()), &config.workdir);
        let controller = CheckpointController::new(observer.clone(), CommitMessageConfig::default());
        let conversation = match &config.conversation_dir {
            Some(dir) => ConversationSource::new(Some(dir.clone())),
            None => ConversationSource::for_project(&config.workdir),
        };
        let suggestions = SuggestionEngine::new(
            Arc::new(ClaudeCli::new(config.assistant_command.clone())),
            SuggestionConfig::default(),
        );

        let options_store = OptionsStore::for_project(&config.workdir);
        let options = options_store.load();
        let audio: Box<dyn SoundPlayer> =
            match SystemPlayer::detect(SystemPlayer::default_sounds_dir(&config.workdir)) {
                Some(player) => Box::new(player),
                None => Box::new(SilentPlayer),
            };

        let app = Self {
            config,
            theme: Theme::default(),
            nav: Navigator::new(),
            session: Session::new(SchedulerConfig::default()),
            options,
            options_store,
            observer,
            controller,
            git,
            conversation,
            suggestions,
            audio,
            tx,
            changes_tx,
            watcher: None,
            ready: false,
            status_in_flight: false,
            spinner: 0,
            should_quit: false,
        };
        (app, rx, changes_rx)
    }

    async fn run(
        mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        mut app_rx: mpsc::UnboundedReceiver<AppEvent>,
        changes_rx: mpsc::UnboundedReceiver<ChangeSource>,
    ) -> anyhow::Result<()> {
        let (batch_tx, mut batch_rx) = mpsc::unbounded_channel::<ChangeBatch>();
        let coalescer = spawn_coalescer(changes_rx, batch_tx);

        let (mut terminal_events, event_tx) = EventHandler::new();
        EventHandler::start(event_tx);

        let mut poll = tokio::time::interval(STATUS_POLL_INTERVAL);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        self.spawn_check();

        while !self.should_quit {
            terminal.draw(|frame| pages::render(frame, &self.view()))?;

            let scheduler_deadline = self.session.scheduler.next_deadline();
            let highlight_deadline = self.session.highlight_deadline();
            let animating = self.nav.is_animating();

            tokio::select! {
                Some(event) = terminal_events.next() => self.on_terminal(event),
                Some(event) = app_rx.recv() => self.on_app_event(event),
                Some(batch) = batch_rx.recv() => self.on_changes(batch),
                _ = sleep_until(scheduler_deadline) => {}
                _ = sleep_until(highlight_deadline) => self.session.expire_highlight(Instant::now()),
                _ = poll.tick() => self.on_poll(),
                _ = tokio::time::sleep(SPINNER_INTERVAL), if animating => {
                    self.spinner = self.spinner.wrapping_add(1);
                }
            }

            self.tick_scheduler();
        }

        coalescer.abort();
        info!("Exiting");
        Ok(())
    }

    fn view(&self) -> View<'_> {
        let session = &self.session;
        View {
            theme: &self.theme,
            nav: &self.nav,
            repo: &session.repo,
            latest_input: session.latest_input.as_ref(),
            options: &self.options,
            auto_phase: session
                .scheduler
                .is_enabled()
                .then(|| session.scheduler.phase()),
            highlight: session.highlight.as_ref().map(|h| &h.id),
            notice: session.notice.as_deref(),
            spinner: self.spinner,
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    fn on_terminal(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Quit => self.should_quit = true,
            TuiEvent::Resize(_, _) => {}
            TuiEvent::Key(key) => {
                self.session.notice = None;
                let ctx = NavContext {
                    checkpoints: &self.session.repo.checkpoints,
                    latest_input: self.session.latest_input.as_ref(),
                };
                let reaction = self.nav.handle_key(key, &ctx);
                if let Some(cue) = reaction.cue {
                    self.play(cue);
                }
                self.execute(reaction.command);
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::None => {}
            Command::Quit => self.should_quit = true,
            Command::Create(strategy) => self.spawn_create(Origin::Manual, strategy),
            Command::Undo => {
                let checkpoints = self.session.repo.checkpoints.clone();
                self.spawn_mutation(Origin::Manual, move |controller| async move {
                    controller.undo(&checkpoints).await
                });
            }
            Command::Revert(target) => {
                let checkpoints = self.session.repo.checkpoints.clone();
                self.spawn_mutation(Origin::Manual, move |controller| async move {
                    controller.revert(&checkpoints, &target).await
                });
            }
            Command::Initialize => {
                self.spawn_mutation(Origin::Manual, |controller| async move {
                    controller.initialize().await
                });
            }
            Command::RequestSuggestions(request_id) => self.spawn_suggestions(request_id),
            Command::ToggleOption(key) => self.toggle_option(key),
        }
    }

    fn toggle_option(&mut self, key: OptionKey) {
        let enabled = self.options.toggle(key);
        self.options_store.save(&self.options);
        info!("{} {}", key.label(), if enabled { "enabled" } else { "disabled" });

        if key == OptionKey::AutoCheckpoint {
            self.session.set_auto_checkpoint(enabled);
        }
    }

    fn play(&self, cue: SoundCue) {
        if self.options.audio_enabled {
            self.audio.play(cue);
        }
    }

    // ========================================================================
    // Completions
    // ========================================================================

    fn on_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Checked(result) => {
                self.nav.apply_check(&result);
                match result {
                    Ok(()) => self.on_ready(),
                    Err(e) => debug!("Repository check: {}", e),
                }
            }
            AppEvent::Refreshed(ticket, result) => {
                let changed = self.session.finish_refresh(ticket, result);
                self.apply_list(changed);
                if let Some(ticket) = self.session.follow_up_refresh() {
                    self.spawn_refresh(ticket);
                }
            }
            AppEvent::Status(result) => {
                self.status_in_flight = false;
                self.session.repo.apply_status(result);
            }
            AppEvent::LatestInput(input) => {
                self.session.apply_latest_input(
                    input,
                    self.options.auto_checkpoint_enabled,
                    Instant::now(),
                );
            }
            AppEvent::Mutated { origin, result } => self.apply_mutation(origin, result),
            AppEvent::Suggestions { request_id, result } => {
                if let Err(e) = &result {
                    warn!("Suggestion request {} failed: {}", request_id, e);
                }
                if !self.nav.apply_suggestions(request_id, result) {
                    debug!("Ignoring stale suggestion request {}", request_id);
                }
            }
        }
    }

    fn on_ready(&mut self) {
        if self.ready {
            return;
        }
        self.ready = true;
        self.request_refresh();
        self.spawn_latest_input();
        self.start_watcher();
    }

    /// The selection returns to the top only when the timeline itself
    /// changed
    fn apply_list(&mut self, changed: Option<bool>) {
        if let Some(changed) = changed {
            self.nav
                .apply_list(self.session.repo.checkpoints.len(), changed);
        }
    }

    fn apply_mutation(&mut self, origin: Origin, result: Result<MutationOutcome, CheckpointError>) {
        let initialized = matches!(self.nav.screen(), Screen::RepositoryInitPrompt { .. });
        let changed = self.session.finish_mutation(origin, &result, Instant::now());
        self.apply_list(changed);

        if origin == Origin::Manual {
            if let Err(e) = &result {
                warn!("Checkpoint operation failed: {}", e);
            }
            self.nav.apply_mutation(&result);
            if initialized && result.is_ok() {
                self.on_ready();
            }
        }
    }

    fn on_changes(&mut self, batch: ChangeBatch) {
        if batch.repository {
            self.request_refresh();
        }
        if batch.conversation {
            if let Some(watcher) = &mut self.watcher {
                watcher.rearm();
            }
            self.spawn_latest_input();
        }
    }

    fn on_poll(&mut self) {
        if !self.ready {
            return;
        }
        if !self.status_in_flight {
            self.spawn_status();
        }
        match &self.watcher {
            None => {
                self.request_refresh();
                self.spawn_latest_input();
            }
            // Conversation directory not there yet
            Some(watcher) if !watcher.watches_conversation() => self.spawn_latest_input(),
            Some(_) => {}
        }
    }

    fn tick_scheduler(&mut self) {
        let commits = self
            .session
            .tick(Instant::now(), self.nav.is_manual_flow());
        for text in commits {
            debug!("Automatic checkpoint for {:?}", text);
            self.spawn_create(Origin::Automatic, CreateStrategy::Automatic(text));
        }
    }

    // ========================================================================
    // Spawned work
    // ========================================================================

    fn start_watcher(&mut self) {
        if !self.config.watch || self.watcher.is_some() {
            return;
        }
        match ChangeWatcher::start(
            self.git.git_dir(),
            self.conversation.dir().map(PathBuf::from),
            self.changes_tx.clone(),
        ) {
            Ok(watcher) if !watcher.watched().is_empty() => self.watcher = Some(watcher),
            Ok(_) => debug!("Nothing to watch; relying on polling"),
            Err(e) => warn!("File watching unavailable, polling instead: {}", e),
        }
    }

    fn send_when<F>(&self, work: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // Receiver gone means the loop has exited
            let _ = tx.send(work.await);
        });
    }

    fn spawn_check(&self) {
        let observer = self.observer.clone();
        self.send_when(async move { AppEvent::Checked(observer.check().await) });
    }

    fn request_refresh(&mut self) {
        if let Some(ticket) = self.session.request_refresh() {
            self.spawn_refresh(ticket);
        }
    }

    fn spawn_refresh(&self, ticket: RefreshTicket) {
        let observer = self.observer.clone();
        self.send_when(async move { AppEvent::Refreshed(ticket, observer.refresh().await) });
    }

    fn spawn_status(&mut self) {
        self.status_in_flight = true;
        let observer = self.observer.clone();
        self.send_when(async move { AppEvent::Status(observer.status().await) });
    }

    fn spawn_latest_input(&self) {
        let conversation = self.conversation.clone();
        self.send_when(async move { AppEvent::LatestInput(conversation.latest().await) });
    }

    fn spawn_mutation<F, Fut>(&self, origin: Origin, op: F)
    where
        F: FnOnce(CheckpointController) -> Fut + Send + 'static,
        Fut: Future<Output = Result<MutationOutcome, CheckpointError>> + Send + 'static,
    {
        let controller = self.controller.clone();
        self.send_when(async move {
            AppEvent::Mutated {
                origin,
                result: op(controller).await,
            }
        });
    }

    fn spawn_create(&self, origin: Origin, strategy: CreateStrategy) {
        let prefix = self.options.custom_prefix_enabled;
        self.spawn_mutation(origin, move |controller| async move {
            controller.create(strategy, prefix).await
        });
    }

    fn spawn_suggestions(&self, request_id: u64) {
        let engine = self.suggestions.clone();
        let observer = self.observer.clone();
        let status = self.session.repo.status.clone();
        let checkpoints = self.session.repo.checkpoints.clone();
        let latest_input = self.session.latest_input.as_ref().map(|i| i.text.clone());
        self.send_when(async move {
            let context = SuggestionContext::collect(
                observer.backend().as_ref(),
                &status,
                &checkpoints,
                latest_input,
                engine.config(),
            )
            .await;
            AppEvent::Suggestions {
                request_id,
                result: engine.generate(&context).await,
            }
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
