//! Screen navigation
//!
//! Exactly one [`Screen`] is active at a time. [`Navigator::handle_key`] is
//! the single reducer for key presses; it returns a [`Reaction`] naming the
//! side effect the loop must start. Results of those effects come back
//! through the `apply_*` methods.

use crossterm::event::{KeyCode, KeyEvent};
use vibepoints_core::{
    checkpoints_lost_by_revert, Checkpoint, CheckpointError, CheckpointId, ConversationInput,
    CreateStrategy, MutationOutcome, SuggestionError, SuggestionSet,
};
use vibepoints_foundation::OptionKey;

use crate::audio::SoundCue;

pub const MAIN_VISIBLE_ROWS: usize = 4;
pub const OPTIONS_VISIBLE_ROWS: usize = 3;
pub const SUGGESTION_VISIBLE_ROWS: usize = 4;

// ============================================================================
// List cursor
// ============================================================================

/// Selection inside a scrolling list. The window only moves when the
/// selection would leave it, and then by the smallest amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListCursor {
    pub selected: usize,
    pub window_start: usize,
    visible: usize,
}

impl ListCursor {
    pub fn new(visible: usize) -> Self {
        Self {
            selected: 0,
            window_start: 0,
            visible: visible.max(1),
        }
    }

    pub fn at(visible: usize, selected: usize) -> Self {
        let mut cursor = Self::new(visible);
        cursor.selected = selected;
        cursor.follow();
        cursor
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    fn follow(&mut self) {
        if self.selected < self.window_start {
            self.window_start = self.selected;
        } else if self.selected >= self.window_start + self.visible {
            self.window_start = self.selected + 1 - self.visible;
        }
    }

    /// Returns true when the selection moved
    pub fn up(&mut self) -> bool {
        if self.selected == 0 {
            return false;
        }
        self.selected -= 1;
        self.follow();
        true
    }

    pub fn down(&mut self, len: usize) -> bool {
        if self.selected + 1 >= len {
            return false;
        }
        self.selected += 1;
        self.follow();
        true
    }

    pub fn reset(&mut self) {
        self.selected = 0;
        self.window_start = 0;
    }

    /// Keep the selection inside a list that may have shrunk
    pub fn clamp(&mut self, len: usize) {
        let last = len.saturating_sub(1);
        if self.selected > last {
            self.selected = last;
        }
        self.follow();
    }

    /// Indices currently on screen
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.window_start.min(len);
        start..(start + self.visible).min(len)
    }
}

// ============================================================================
// Screens
// ============================================================================

pub const CREATE_OPTIONS: [&str; 3] = [
    "Use last input",
    "Write a custom message",
    "Suggest a message with AI",
];

pub const SUGGESTION_ERROR_OPTIONS: [&str; 3] = ["Try again", "Write my own", "Cancel"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomDraft {
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsView {
    Checkpoint(Box<Checkpoint>),
    LastInput,
}

#[derive(Debug, Clone)]
pub enum SuggestionFlow {
    Loading {
        request_id: u64,
    },
    Suggestions {
        set: SuggestionSet,
        cursor: ListCursor,
        busy: bool,
        error: Option<String>,
    },
    Error {
        error: String,
        cursor: ListCursor,
    },
}

#[derive(Debug, Clone)]
pub enum Screen {
    Checking {
        error: Option<String>,
    },
    RepositoryInitPrompt {
        busy: bool,
        error: Option<String>,
    },
    Main,
    Options {
        cursor: ListCursor,
    },
    UndoConfirm {
        busy: bool,
        error: Option<String>,
    },
    RevertConfirm {
        target: Box<Checkpoint>,
        lost: Vec<Checkpoint>,
        busy: bool,
        error: Option<String>,
    },
    CreateMenu {
        cursor: ListCursor,
        busy: bool,
        error: Option<String>,
    },
    CustomLabel {
        draft: CustomDraft,
        error: Option<String>,
    },
    CustomDescription {
        draft: CustomDraft,
        busy: bool,
        error: Option<String>,
    },
    Details {
        view: DetailsView,
    },
    Suggestion(SuggestionFlow),
}

impl Screen {
    pub fn create_menu() -> Self {
        Screen::CreateMenu {
            cursor: ListCursor::new(CREATE_OPTIONS.len()),
            busy: false,
            error: None,
        }
    }

    fn create_menu_at(option: usize) -> Self {
        Screen::CreateMenu {
            cursor: ListCursor::at(CREATE_OPTIONS.len(), option),
            busy: false,
            error: None,
        }
    }

    fn custom_label(draft: CustomDraft) -> Self {
        Screen::CustomLabel { draft, error: None }
    }

    /// A mutating call started from this screen is still running
    pub fn is_busy(&self) -> bool {
        match self {
            Screen::RepositoryInitPrompt { busy, .. }
            | Screen::UndoConfirm { busy, .. }
            | Screen::RevertConfirm { busy, .. }
            | Screen::CreateMenu { busy, .. }
            | Screen::CustomDescription { busy, .. } => *busy,
            Screen::Suggestion(SuggestionFlow::Suggestions { busy, .. }) => *busy,
            _ => false,
        }
    }

    /// Where Esc leads; `None` means quit
    pub fn cancel_target(&self) -> Option<Screen> {
        match self {
            Screen::Main | Screen::Checking { .. } | Screen::RepositoryInitPrompt { .. } => None,
            Screen::Options { .. }
            | Screen::UndoConfirm { .. }
            | Screen::RevertConfirm { .. }
            | Screen::Details { .. }
            | Screen::CreateMenu { .. } => Some(Screen::Main),
            Screen::CustomLabel { .. } => Some(Screen::create_menu_at(1)),
            Screen::CustomDescription { draft, .. } => Some(Screen::custom_label(draft.clone())),
            Screen::Suggestion(_) => Some(Screen::create_menu_at(2)),
        }
    }

    /// Attach a failure to the screen that started the call
    fn fail(&mut self, message: String) {
        match self {
            Screen::RepositoryInitPrompt { busy, error }
            | Screen::UndoConfirm { busy, error }
            | Screen::RevertConfirm { busy, error, .. }
            | Screen::CreateMenu { busy, error, .. }
            | Screen::CustomDescription { busy, error, .. } => {
                *busy = false;
                *error = Some(message);
            }
            Screen::Suggestion(SuggestionFlow::Suggestions { busy, error, .. }) => {
                *busy = false;
                *error = Some(message);
            }
            _ => {}
        }
    }
}

// ============================================================================
// Reactions
// ============================================================================

/// Side effect requested by a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
    Create(CreateStrategy),
    Undo,
    Revert(CheckpointId),
    Initialize,
    RequestSuggestions(u64),
    ToggleOption(OptionKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub command: Command,
    pub cue: Option<SoundCue>,
}

impl Reaction {
    fn none() -> Self {
        Self {
            command: Command::None,
            cue: None,
        }
    }

    fn cue(cue: SoundCue) -> Self {
        Self {
            command: Command::None,
            cue: Some(cue),
        }
    }

    fn moved(moved: bool) -> Self {
        Self {
            command: Command::None,
            cue: moved.then_some(SoundCue::MenuMove),
        }
    }

    fn run(command: Command, cue: SoundCue) -> Self {
        Self {
            command,
            cue: Some(cue),
        }
    }
}

/// Read-only data the reducer needs
pub struct NavContext<'a> {
    pub checkpoints: &'a [Checkpoint],
    pub latest_input: Option<&'a ConversationInput>,
}

// ============================================================================
// Navigator
// ============================================================================

pub struct Navigator {
    screen: Screen,
    /// Main list: row 0 is "new checkpoint", row i is checkpoint i-1
    main: ListCursor,
    next_request_id: u64,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            screen: Screen::Checking { error: None },
            main: ListCursor::new(MAIN_VISIBLE_ROWS),
            next_request_id: 0,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn main_cursor(&self) -> &ListCursor {
        &self.main
    }

    /// The user is composing a checkpoint by hand
    pub fn is_manual_flow(&self) -> bool {
        matches!(
            self.screen,
            Screen::CreateMenu { .. }
                | Screen::CustomLabel { .. }
                | Screen::CustomDescription { .. }
                | Screen::Suggestion(_)
        )
    }

    /// Waiting on the assistant
    pub fn is_loading(&self) -> bool {
        matches!(self.screen, Screen::Suggestion(SuggestionFlow::Loading { .. }))
    }

    /// A spinner is on screen
    pub fn is_animating(&self) -> bool {
        self.is_loading()
            || self.screen.is_busy()
            || matches!(self.screen, Screen::Checking { error: None })
    }

    fn start_suggestions(&mut self) -> Reaction {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.screen = Screen::Suggestion(SuggestionFlow::Loading { request_id });
        Reaction::run(Command::RequestSuggestions(request_id), SoundCue::Confirm)
    }

    /// Single reducer for key presses
    pub fn handle_key(&mut self, key: KeyEvent, ctx: &NavContext<'_>) -> Reaction {
        if self.screen.is_busy() {
            return Reaction::none();
        }

        if key.code == KeyCode::Esc {
            return match self.screen.cancel_target() {
                Some(target) => {
                    self.screen = target;
                    Reaction::cue(SoundCue::Cancel)
                }
                None => Reaction {
                    command: Command::Quit,
                    cue: None,
                },
            };
        }

        let screen = std::mem::replace(&mut self.screen, Screen::Main);
        let (screen, reaction) = self.reduce(screen, key.code, ctx);
        self.screen = screen;
        reaction
    }

    fn reduce(&mut self, screen: Screen, code: KeyCode, ctx: &NavContext<'_>) -> (Screen, Reaction) {
        match screen {
            Screen::Checking { .. } => match code {
                KeyCode::Char('q') => (screen, Reaction::run(Command::Quit, SoundCue::Cancel)),
                _ => (screen, Reaction::none()),
            },

            Screen::RepositoryInitPrompt { .. } => match code {
                KeyCode::Char('y') | KeyCode::Enter => (
                    Screen::RepositoryInitPrompt {
                        busy: true,
                        error: None,
                    },
                    Reaction::run(Command::Initialize, SoundCue::Confirm),
                ),
                KeyCode::Char('n') | KeyCode::Char('q') => (screen, Reaction {
                    command: Command::Quit,
                    cue: None,
                }),
                _ => (screen, Reaction::none()),
            },

            Screen::Main => self.reduce_main(code, ctx),

            Screen::Options { mut cursor } => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    let moved = cursor.up();
                    (Screen::Options { cursor }, Reaction::moved(moved))
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let moved = cursor.down(OptionKey::ALL.len());
                    (Screen::Options { cursor }, Reaction::moved(moved))
                }
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => {
                    let key = OptionKey::ALL[cursor.selected];
                    (
                        Screen::Options { cursor },
                        Reaction::run(Command::ToggleOption(key), SoundCue::Confirm),
                    )
                }
                _ => (Screen::Options { cursor }, Reaction::none()),
            },

            Screen::UndoConfirm { .. } => match code {
                KeyCode::Char('y') => (
                    Screen::UndoConfirm {
                        busy: true,
                        error: None,
                    },
                    Reaction::run(Command::Undo, SoundCue::Revert),
                ),
                _ => (screen, Reaction::none()),
            },

            Screen::RevertConfirm { target, lost, .. } => match code {
                KeyCode::Char('y') => {
                    let id = target.id.clone();
                    (
                        Screen::RevertConfirm {
                            target,
                            lost,
                            busy: true,
                            error: None,
                        },
                        Reaction::run(Command::Revert(id), SoundCue::Revert),
                    )
                }
                _ => (
                    Screen::RevertConfirm {
                        target,
                        lost,
                        busy: false,
                        error: None,
                    },
                    Reaction::none(),
                ),
            },

            Screen::CreateMenu { mut cursor, error, .. } => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    let moved = cursor.up();
                    (
                        Screen::CreateMenu { cursor, busy: false, error },
                        Reaction::moved(moved),
                    )
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let moved = cursor.down(CREATE_OPTIONS.len());
                    (
                        Screen::CreateMenu { cursor, busy: false, error },
                        Reaction::moved(moved),
                    )
                }
                KeyCode::Enter => match cursor.selected {
                    0 => (
                        Screen::CreateMenu {
                            cursor,
                            busy: true,
                            error: None,
                        },
                        Reaction::run(
                            Command::Create(CreateStrategy::LastInput(
                                ctx.latest_input.cloned(),
                            )),
                            SoundCue::Confirm,
                        ),
                    ),
                    1 => (
                        Screen::custom_label(CustomDraft::default()),
                        Reaction::cue(SoundCue::Confirm),
                    ),
                    _ => {
                        let reaction = self.start_suggestions();
                        (std::mem::replace(&mut self.screen, Screen::Main), reaction)
                    }
                },
                _ => (
                    Screen::CreateMenu { cursor, busy: false, error },
                    Reaction::none(),
                ),
            },

            Screen::CustomLabel { mut draft, error } => match code {
                KeyCode::Enter => {
                    if draft.label.trim().is_empty() {
                        (
                            Screen::CustomLabel {
                                draft,
                                error: Some("Label cannot be empty".to_string()),
                            },
                            Reaction::none(),
                        )
                    } else {
                        (
                            Screen::CustomDescription {
                                draft,
                                busy: false,
                                error: None,
                            },
                            Reaction::cue(SoundCue::Confirm),
                        )
                    }
                }
                KeyCode::Backspace => {
                    draft.label.pop();
                    (Screen::CustomLabel { draft, error }, Reaction::none())
                }
                KeyCode::Char(c) => {
                    draft.label.push(c);
                    (Screen::CustomLabel { draft, error: None }, Reaction::none())
                }
                _ => (Screen::CustomLabel { draft, error }, Reaction::none()),
            },

            Screen::CustomDescription { mut draft, error, .. } => match code {
                KeyCode::Enter => {
                    let strategy = CreateStrategy::Custom {
                        label: draft.label.clone(),
                        description: draft.description.clone(),
                    };
                    (
                        Screen::CustomDescription {
                            draft,
                            busy: true,
                            error: None,
                        },
                        Reaction::run(Command::Create(strategy), SoundCue::Confirm),
                    )
                }
                KeyCode::Backspace => {
                    draft.description.pop();
                    (
                        Screen::CustomDescription { draft, busy: false, error },
                        Reaction::none(),
                    )
                }
                KeyCode::Char(c) => {
                    draft.description.push(c);
                    (
                        Screen::CustomDescription { draft, busy: false, error },
                        Reaction::none(),
                    )
                }
                _ => (
                    Screen::CustomDescription { draft, busy: false, error },
                    Reaction::none(),
                ),
            },

            Screen::Details { .. } => match code {
                KeyCode::Enter | KeyCode::Char('q') => (Screen::Main, Reaction::cue(SoundCue::Cancel)),
                _ => (screen, Reaction::none()),
            },

            Screen::Suggestion(flow) => self.reduce_suggestion(flow, code),
        }
    }

    fn reduce_main(&mut self, code: KeyCode, ctx: &NavContext<'_>) -> (Screen, Reaction) {
        let rows = ctx.checkpoints.len() + 1;
        match code {
            KeyCode::Char('q') => (Screen::Main, Reaction {
                command: Command::Quit,
                cue: None,
            }),
            KeyCode::Up | KeyCode::Char('k') => {
                let moved = self.main.up();
                (Screen::Main, Reaction::moved(moved))
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let moved = self.main.down(rows);
                (Screen::Main, Reaction::moved(moved))
            }
            KeyCode::Char('c') => (Screen::create_menu(), Reaction::cue(SoundCue::Confirm)),
            KeyCode::Enter => match self.main.selected {
                0 => (Screen::create_menu(), Reaction::cue(SoundCue::Confirm)),
                row => match ctx.checkpoints.get(row - 1) {
                    Some(checkpoint) => (
                        Screen::Details {
                            view: DetailsView::Checkpoint(Box::new(checkpoint.clone())),
                        },
                        Reaction::cue(SoundCue::Confirm),
                    ),
                    None => (Screen::Main, Reaction::none()),
                },
            },
            KeyCode::Char('r') => {
                let Some(target) = self
                    .main
                    .selected
                    .checked_sub(1)
                    .and_then(|i| ctx.checkpoints.get(i))
                else {
                    return (Screen::Main, Reaction::none());
                };
                match checkpoints_lost_by_revert(ctx.checkpoints, &target.id) {
                    Ok(lost) => (
                        Screen::RevertConfirm {
                            target: Box::new(target.clone()),
                            lost,
                            busy: false,
                            error: None,
                        },
                        Reaction::cue(SoundCue::Confirm),
                    ),
                    Err(_) => (Screen::Main, Reaction::none()),
                }
            }
            KeyCode::Char('u') => (
                Screen::UndoConfirm {
                    busy: false,
                    error: None,
                },
                Reaction::cue(SoundCue::Confirm),
            ),
            KeyCode::Char('o') => (
                Screen::Options {
                    cursor: ListCursor::new(OPTIONS_VISIBLE_ROWS),
                },
                Reaction::cue(SoundCue::Confirm),
            ),
            KeyCode::Char('v') => (
                Screen::Details {
                    view: DetailsView::LastInput,
                },
                Reaction::cue(SoundCue::Confirm),
            ),
            _ => (Screen::Main, Reaction::none()),
        }
    }

    fn reduce_suggestion(&mut self, flow: SuggestionFlow, code: KeyCode) -> (Screen, Reaction) {
        match flow {
            SuggestionFlow::Loading { .. } => (Screen::Suggestion(flow), Reaction::none()),

            SuggestionFlow::Suggestions {
                set,
                mut cursor,
                error,
                ..
            } => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    let moved = cursor.up();
                    (
                        Screen::Suggestion(SuggestionFlow::Suggestions {
                            set,
                            cursor,
                            busy: false,
                            error,
                        }),
                        Reaction::moved(moved),
                    )
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let moved = cursor.down(set.suggestions.len());
                    (
                        Screen::Suggestion(SuggestionFlow::Suggestions {
                            set,
                            cursor,
                            busy: false,
                            error,
                        }),
                        Reaction::moved(moved),
                    )
                }
                KeyCode::Enter => {
                    let Some(message) = set
                        .suggestions
                        .get(cursor.selected)
                        .map(|s| s.message.clone())
                    else {
                        return (
                            Screen::Suggestion(SuggestionFlow::Suggestions {
                                set,
                                cursor,
                                busy: false,
                                error,
                            }),
                            Reaction::none(),
                        );
                    };
                    (
                        Screen::Suggestion(SuggestionFlow::Suggestions {
                            set,
                            cursor,
                            busy: true,
                            error: None,
                        }),
                        Reaction::run(
                            Command::Create(CreateStrategy::AiAssisted(message)),
                            SoundCue::Confirm,
                        ),
                    )
                }
                KeyCode::Char('r') => {
                    let reaction = self.start_suggestions();
                    (std::mem::replace(&mut self.screen, Screen::Main), reaction)
                }
                _ => (
                    Screen::Suggestion(SuggestionFlow::Suggestions {
                        set,
                        cursor,
                        busy: false,
                        error,
                    }),
                    Reaction::none(),
                ),
            },

            SuggestionFlow::Error { error, mut cursor } => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    let moved = cursor.up();
                    (
                        Screen::Suggestion(SuggestionFlow::Error { error, cursor }),
                        Reaction::moved(moved),
                    )
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let moved = cursor.down(SUGGESTION_ERROR_OPTIONS.len());
                    (
                        Screen::Suggestion(SuggestionFlow::Error { error, cursor }),
                        Reaction::moved(moved),
                    )
                }
                KeyCode::Enter => match cursor.selected {
                    0 => {
                        let reaction = self.start_suggestions();
                        (std::mem::replace(&mut self.screen, Screen::Main), reaction)
                    }
                    1 => (
                        Screen::custom_label(CustomDraft::default()),
                        Reaction::cue(SoundCue::Confirm),
                    ),
                    _ => (Screen::create_menu_at(2), Reaction::cue(SoundCue::Cancel)),
                },
                _ => (
                    Screen::Suggestion(SuggestionFlow::Error { error, cursor }),
                    Reaction::none(),
                ),
            },
        }
    }

    // ========================================================================
    // Completions
    // ========================================================================

    /// Repository check finished
    pub fn apply_check(&mut self, result: &Result<(), CheckpointError>) {
        if !matches!(self.screen, Screen::Checking { .. }) {
            return;
        }
        self.screen = match result {
            Ok(()) => Screen::Main,
            Err(CheckpointError::RepositoryUnavailable(_)) => Screen::RepositoryInitPrompt {
                busy: false,
                error: None,
            },
            Err(e) => Screen::Checking {
                error: Some(e.to_string()),
            },
        };
    }

    /// A manual create / undo / revert / init finished. Success returns to
    /// the main list with the selection on top; failure stays on the
    /// screen that started it.
    pub fn apply_mutation(&mut self, result: &Result<MutationOutcome, CheckpointError>) {
        match result {
            Ok(_) => {
                self.screen = Screen::Main;
                self.main.reset();
            }
            Err(e) => self.screen.fail(e.to_string()),
        }
    }

    /// Suggestions arrived. Results for an abandoned request are ignored;
    /// returns whether they were applied.
    pub fn apply_suggestions(
        &mut self,
        request_id: u64,
        result: Result<SuggestionSet, SuggestionError>,
    ) -> bool {
        match &self.screen {
            Screen::Suggestion(SuggestionFlow::Loading { request_id: active })
                if *active == request_id => {}
            _ => return false,
        }
        self.screen = Screen::Suggestion(match result {
            Ok(set) => SuggestionFlow::Suggestions {
                set,
                cursor: ListCursor::new(SUGGESTION_VISIBLE_ROWS),
                busy: false,
                error: None,
            },
            Err(e) => SuggestionFlow::Error {
                error: e.to_string(),
                cursor: ListCursor::new(SUGGESTION_ERROR_OPTIONS.len()),
            },
        });
        true
    }

    /// The checkpoint list was replaced
    pub fn apply_list(&mut self, len: usize, newest_changed: bool) {
        if newest_changed {
            self.main.reset();
        } else {
            self.main.clamp(len + 1);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
