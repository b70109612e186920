//! Main page: the checkpoint timeline
//!
//! ```text
//! ┌ vibepoints ────────────────────────────────────────────┐
//! │ ⎇ main  3 uncommitted (+1 ~2 -0)  auto: waiting         │
//! │ 12 checkpoints                                          │
//! └─────────────────────────────────────────────────────────┘
//! ┌ Checkpoints ───────────────────────────────────────────┐
//! │ + New checkpoint                                        │
//! │   a1b2c3d  Vibe: fix bug     Jan 5, 2025 at 3:04 PM     │
//! └─────────────────────────────────────────────────────────┘
//!   Last input: make the button blue
//!   ↑↓ move  enter open  c create  u undo  r revert  o options  q quit
//! ```

use super::{help_line, View};
use crate::tui::theme::icons;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use vibepoints_core::{AutoPhase, Checkpoint};
use vibepoints_foundation::strings::{collapse_whitespace, truncate_with_ellipsis};

/// Width of the last-input preview
pub const PREVIEW_CHARS: usize = 72;

pub fn render(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let [header, list, preview, help] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(crate::tui::navigation::MAIN_VISIBLE_ROWS as u16 + 2),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header, view);
    render_list(frame, list, view);
    render_preview(frame, preview, view);

    let keys = help_line(
        view.theme,
        &[
            ("↑↓", "move"),
            ("enter", "open"),
            ("c", "create"),
            ("u", "undo"),
            ("r", "revert"),
            ("v", "last input"),
            ("o", "options"),
            ("q", "quit"),
        ],
    );
    frame.render_widget(Paragraph::new(keys), help);
}

fn render_header(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let theme = view.theme;
    let status = &view.repo.status;

    let mut spans = Vec::new();
    if status.is_detached {
        spans.push(Span::styled(
            format!("{} detached HEAD", icons::WARNING),
            theme.warning(),
        ));
    } else {
        let branch = status.branch.as_deref().unwrap_or("(no branch)");
        spans.push(Span::styled(
            format!("{} {}", icons::BRANCH, branch),
            theme.text_accent(),
        ));
    }
    if status.has_conflicts {
        spans.push(Span::styled(
            format!("  {} conflicts", icons::WARNING),
            theme.error(),
        ));
    }
    if status.uncommitted_count > 0 {
        spans.push(Span::styled(
            format!(
                "  {} uncommitted ({})",
                status.uncommitted_count, status.changes
            ),
            theme.text(),
        ));
    } else {
        spans.push(Span::styled(
            format!("  {} clean", icons::CHECK),
            theme.success(),
        ));
    }
    if let Some(phase) = view.auto_phase {
        spans.push(Span::styled(
            format!("  auto: {}", phase_label(phase)),
            theme.text_muted(),
        ));
    }

    let second = if let Some(banner) = &view.repo.banner {
        Line::styled(format!("{} {}", icons::CROSS, banner), theme.error())
    } else if let Some(notice) = view.notice {
        Line::styled(format!("{} {}", icons::WARNING, notice), theme.warning())
    } else if let Some(empty) = view.repo.empty_notice() {
        Line::styled(empty.to_string(), theme.text_muted())
    } else {
        Line::styled(
            format!("{} checkpoints", view.repo.checkpoints.len()),
            theme.text_muted(),
        )
    };

    let block = Block::default()
        .title(Span::styled(" vibepoints ", theme.header()))
        .borders(Borders::ALL)
        .border_style(theme.border());
    frame.render_widget(
        Paragraph::new(vec![Line::from(spans), second]).block(block),
        area,
    );
}

fn phase_label(phase: AutoPhase) -> &'static str {
    match phase {
        AutoPhase::Idle => "on",
        AutoPhase::Debouncing => "waiting",
        AutoPhase::Committing => "saving",
        AutoPhase::Flashing => "saved",
        AutoPhase::Cooldown => "cooling down",
    }
}

fn render_list(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let theme = view.theme;
    let cursor = view.nav.main_cursor();
    let checkpoints = &view.repo.checkpoints;
    let rows = checkpoints.len() + 1;
    let window = cursor.window(rows);

    let lines: Vec<Line> = window
        .clone()
        .map(|row| {
            let selected = row == cursor.selected;
            let marker = if selected { icons::PROMPT } else { " " };
            let line = match row.checked_sub(1).and_then(|i| checkpoints.get(i)) {
                None => Line::from(vec![
                    Span::styled(format!("{} ", marker), theme.text_accent()),
                    Span::styled(format!("{} New checkpoint", icons::NEW), theme.text_bold()),
                ]),
                Some(checkpoint) => checkpoint_line(view, marker, checkpoint),
            };
            let highlighted = row
                .checked_sub(1)
                .and_then(|i| checkpoints.get(i))
                .is_some_and(|c| Some(&c.id) == view.highlight);
            if highlighted {
                line.style(theme.highlighted())
            } else if selected {
                line.style(theme.selected())
            } else {
                line
            }
        })
        .collect();

    let mut title = String::from(" Checkpoints ");
    if window.start > 0 {
        title.push_str("↑ ");
    }
    if window.end < rows {
        title.push_str("↓ ");
    }
    let block = Block::default()
        .title(Span::styled(title, theme.text_bold()))
        .borders(Borders::ALL)
        .border_style(theme.border_focused());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn checkpoint_line(view: &View<'_>, marker: &str, checkpoint: &Checkpoint) -> Line<'static> {
    let theme = view.theme;
    Line::from(vec![
        Span::styled(format!("{} ", marker), theme.text_accent()),
        Span::styled(format!("{}  ", checkpoint.id.short()), theme.text_muted()),
        Span::styled(truncate_with_ellipsis(&checkpoint.subject, 48), theme.text()),
        Span::styled(
            format!("  {}  {}", checkpoint.display_timestamp(), checkpoint.changes),
            theme.text_muted(),
        ),
    ])
}

fn render_preview(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let theme = view.theme;
    let line = match view.latest_input {
        Some(input) => Line::from(vec![
            Span::styled("  Last input: ", theme.text_muted()),
            Span::styled(input_preview(&input.text), theme.text()),
        ]),
        None => Line::styled("  No conversation input yet", theme.text_muted()),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Single-line preview of a conversation input
pub fn input_preview(text: &str) -> String {
    truncate_with_ellipsis(&collapse_whitespace(text), PREVIEW_CHARS)
}
