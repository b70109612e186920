//! Startup screens, confirmations and the options popup

use super::{frame_layout, help_line, outcome_line, popup, View};
use crate::tui::navigation::ListCursor;
use crate::tui::theme::icons;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use vibepoints_core::Checkpoint;
use vibepoints_foundation::OptionKey;

pub fn render_checking(frame: &mut Frame, area: Rect, view: &View<'_>, error: Option<&str>) {
    let theme = view.theme;
    let [title, body, help] = frame_layout(area);
    render_title(frame, title, view, " vibepoints ");

    let lines = match error {
        None => vec![Line::styled(
            format!(
                "{} Checking repository...",
                icons::SPINNER[view.spinner % icons::SPINNER.len()]
            ),
            theme.text_muted(),
        )],
        Some(e) => vec![
            Line::styled(format!("{} Repository check failed", icons::CROSS), theme.error()),
            Line::styled(e.to_string(), theme.text()),
        ],
    };
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
    frame.render_widget(Paragraph::new(help_line(theme, &[("q", "quit")])), help);
}

pub fn render_init_prompt(
    frame: &mut Frame,
    area: Rect,
    view: &View<'_>,
    busy: bool,
    error: Option<&str>,
) {
    let theme = view.theme;
    let [title, body, help] = frame_layout(area);
    render_title(frame, title, view, " vibepoints ");

    let mut lines = vec![
        Line::styled("This directory is not a git repository.", theme.text_bold()),
        Line::styled(
            "Initialize one here to start keeping checkpoints?",
            theme.text(),
        ),
        Line::default(),
    ];
    lines.extend(outcome_line(view, busy, error));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
    frame.render_widget(
        Paragraph::new(help_line(theme, &[("y", "initialize"), ("n/esc", "quit")])),
        help,
    );
}

pub fn render_options(frame: &mut Frame, area: Rect, view: &View<'_>, cursor: &ListCursor) {
    let theme = view.theme;
    let area = popup(frame, area, 44, cursor.visible() as u16 + 4);

    let mut lines: Vec<Line> = cursor
        .window(OptionKey::ALL.len())
        .map(|i| {
            let key = OptionKey::ALL[i];
            let enabled = view.options.get(key);
            let (value, value_style) = if enabled {
                ("on ", theme.success())
            } else {
                ("off", theme.text_muted())
            };
            let line = Line::from(vec![
                Span::styled(format!(" [{}] ", value), value_style),
                Span::styled(key.label(), theme.text()),
            ]);
            if i == cursor.selected {
                line.style(theme.selected())
            } else {
                line
            }
        })
        .collect();
    lines.push(Line::default());
    lines.push(help_line(theme, &[("enter", "toggle"), ("esc", "back")]));

    let block = Block::default()
        .title(Span::styled(" Options ", theme.header()))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(theme.border_focused());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_undo(
    frame: &mut Frame,
    area: Rect,
    view: &View<'_>,
    busy: bool,
    error: Option<&str>,
) {
    let theme = view.theme;
    let area = popup(frame, area, 64, 8);

    let mut lines = match view.repo.latest() {
        Some(newest) => vec![
            Line::styled("Undo the latest checkpoint?", theme.text_bold()),
            Line::from(vec![
                Span::styled(format!("  {}  ", newest.id.short()), theme.text_muted()),
                Span::styled(newest.subject.clone(), theme.text()),
            ]),
            Line::styled(
                "Uncommitted changes will be discarded.",
                theme.warning(),
            ),
        ],
        None => vec![Line::styled("There is nothing to undo.", theme.text())],
    };
    lines.extend(outcome_line(view, busy, error));
    lines.push(help_line(theme, &[("y", "undo"), ("esc", "cancel")]));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(confirm_block(view, " Undo ")),
        area,
    );
}

pub fn render_revert(
    frame: &mut Frame,
    area: Rect,
    view: &View<'_>,
    target: &Checkpoint,
    lost: &[Checkpoint],
    busy: bool,
    error: Option<&str>,
) {
    let theme = view.theme;
    let area = popup(frame, area, 72, lost.len().min(8) as u16 + 9);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Revert to ", theme.text_bold()),
            Span::styled(target.subject.clone(), theme.text_accent()),
            Span::styled("?", theme.text_bold()),
        ]),
        Line::styled(
            format!(
                "{} {} newer checkpoint(s) will be lost:",
                icons::WARNING,
                lost.len()
            ),
            theme.warning(),
        ),
    ];
    lines.extend(lost.iter().take(8).map(|c| {
        Line::from(vec![
            Span::styled(format!("  {}  ", c.id.short()), theme.text_muted()),
            Span::styled(c.subject.clone(), theme.text()),
        ])
    }));
    if lost.len() > 8 {
        lines.push(Line::styled(
            format!("  ... and {} more", lost.len() - 8),
            theme.text_muted(),
        ));
    }
    lines.push(Line::default());
    lines.extend(outcome_line(view, busy, error));
    lines.push(help_line(theme, &[("y", "revert"), ("esc", "cancel")]));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(confirm_block(view, " Revert ")),
        area,
    );
}

fn confirm_block<'a>(view: &View<'_>, title: &'a str) -> Block<'a> {
    Block::default()
        .title(Span::styled(title, view.theme.header()))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(view.theme.warning())
}

/// Bordered title bar shared by full-screen pages
pub(super) fn render_title(frame: &mut Frame, area: Rect, view: &View<'_>, title: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(view.theme.border());
    frame.render_widget(
        Paragraph::new(Line::styled(title.trim().to_string(), view.theme.header())).block(block),
        area,
    );
}
