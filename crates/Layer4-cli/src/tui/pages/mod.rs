//! Screen rendering
//!
//! - `timeline.rs` - status header, checkpoint list, input preview
//! - `dialogs.rs` - checking, init prompt, confirmations, options
//! - `create.rs` - creation menu, custom message, suggestions
//! - `details.rs` - checkpoint and last-input details

mod create;
mod details;
mod dialogs;
mod timeline;

use crate::tui::navigation::{Navigator, Screen};
use crate::tui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::Clear,
    Frame,
};
use vibepoints_core::{AutoPhase, CheckpointId, ConversationInput, RepositoryState};
use vibepoints_foundation::Options;

/// Everything a frame needs, borrowed from the app
pub struct View<'a> {
    pub theme: &'a Theme,
    pub nav: &'a Navigator,
    pub repo: &'a RepositoryState,
    pub latest_input: Option<&'a ConversationInput>,
    pub options: &'a Options,
    /// Scheduler phase while auto checkpoints are on
    pub auto_phase: Option<AutoPhase>,
    pub highlight: Option<&'a CheckpointId>,
    pub notice: Option<&'a str>,
    pub spinner: usize,
}

pub fn render(frame: &mut Frame, view: &View<'_>) {
    let area = frame.area();
    match view.nav.screen() {
        Screen::Checking { error } => dialogs::render_checking(frame, area, view, error.as_deref()),
        Screen::RepositoryInitPrompt { busy, error } => {
            dialogs::render_init_prompt(frame, area, view, *busy, error.as_deref())
        }
        Screen::Main => timeline::render(frame, area, view),
        Screen::Options { cursor } => {
            timeline::render(frame, area, view);
            dialogs::render_options(frame, area, view, cursor);
        }
        Screen::UndoConfirm { busy, error } => {
            timeline::render(frame, area, view);
            dialogs::render_undo(frame, area, view, *busy, error.as_deref());
        }
        Screen::RevertConfirm {
            target,
            lost,
            busy,
            error,
        } => {
            timeline::render(frame, area, view);
            dialogs::render_revert(frame, area, view, target, lost, *busy, error.as_deref());
        }
        Screen::CreateMenu {
            cursor,
            busy,
            error,
        } => create::render_menu(frame, area, view, cursor, *busy, error.as_deref()),
        Screen::CustomLabel { draft, error } => {
            create::render_label(frame, area, view, draft, error.as_deref())
        }
        Screen::CustomDescription { draft, busy, error } => {
            create::render_description(frame, area, view, draft, *busy, error.as_deref())
        }
        Screen::Details { view: details } => details::render(frame, area, view, details),
        Screen::Suggestion(flow) => create::render_suggestions(frame, area, view, flow),
    }
}

/// Centered popup area, cleared
fn popup(frame: &mut Frame, area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    frame.render_widget(Clear, popup);
    popup
}

/// Title, body, help line
fn frame_layout(area: Rect) -> [Rect; 3] {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    [layout[0], layout[1], layout[2]]
}

/// "key description" pairs for the bottom line
fn help_line<'a>(theme: &Theme, pairs: &[(&'a str, &'a str)]) -> Line<'a> {
    let mut spans = Vec::with_capacity(pairs.len() * 3);
    for (i, (key, desc)) in pairs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme.text_muted()));
        }
        spans.push(Span::styled(*key, theme.keybind()));
        spans.push(Span::styled(format!(" {}", desc), theme.keybind_desc()));
    }
    Line::from(spans)
}

/// Error or working line under a form
fn outcome_line<'a>(view: &View<'_>, busy: bool, error: Option<&'a str>) -> Option<Line<'a>> {
    use crate::tui::theme::icons;
    if busy {
        let frame = icons::SPINNER[view.spinner % icons::SPINNER.len()];
        return Some(Line::styled(
            format!("{} Working...", frame),
            view.theme.warning(),
        ));
    }
    error.map(|e| Line::styled(format!("{} {}", icons::CROSS, e), view.theme.error()))
}
