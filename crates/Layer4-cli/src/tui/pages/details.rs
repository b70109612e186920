//! Full text of a checkpoint or of the latest conversation input

use super::dialogs::render_title;
use super::{frame_layout, help_line, View};
use crate::tui::navigation::DetailsView;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(frame: &mut Frame, area: Rect, view: &View<'_>, details: &DetailsView) {
    let theme = view.theme;
    let [title, body, help] = frame_layout(area);
    // Borders and padding
    let width = body.width.saturating_sub(4).max(20) as usize;

    let (heading, lines) = match details {
        DetailsView::Checkpoint(checkpoint) => {
            render_title(frame, title, view, "Checkpoint");
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Commit   ", theme.text_muted()),
                    Span::styled(checkpoint.id.to_string(), theme.text_accent()),
                ]),
                Line::from(vec![
                    Span::styled("Created  ", theme.text_muted()),
                    Span::styled(checkpoint.display_timestamp(), theme.text()),
                ]),
                Line::from(vec![
                    Span::styled("Files    ", theme.text_muted()),
                    Span::styled(
                        format!(
                            "{} added, {} modified, {} removed",
                            checkpoint.changes.added,
                            checkpoint.changes.modified,
                            checkpoint.changes.removed
                        ),
                        theme.text(),
                    ),
                ]),
                Line::default(),
            ];
            lines.extend(wrapped(&checkpoint.message(), width, view));
            (" Message ", lines)
        }
        DetailsView::LastInput => {
            render_title(frame, title, view, "Last input");
            let lines = match view.latest_input {
                Some(input) => {
                    let mut lines = vec![
                        Line::styled(input.display_timestamp.clone(), theme.text_muted()),
                        Line::default(),
                    ];
                    lines.extend(wrapped(&input.text, width, view));
                    lines
                }
                None => vec![Line::styled(
                    "No conversation input found for this project.",
                    theme.text_muted(),
                )],
            };
            (" Conversation ", lines)
        }
    };

    let block = Block::default()
        .title(Span::styled(heading, theme.text_bold()))
        .borders(Borders::ALL)
        .border_style(theme.border_focused());
    frame.render_widget(Paragraph::new(lines).block(block), body);
    frame.render_widget(
        Paragraph::new(help_line(theme, &[("enter/esc", "back")])),
        help,
    );
}

/// Wrap each paragraph to `width`, keeping blank lines
fn wrapped(text: &str, width: usize, view: &View<'_>) -> Vec<Line<'static>> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![Line::default()]
            } else {
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(|part| Line::styled(part.into_owned(), view.theme.text()))
                    .collect()
            }
        })
        .collect()
}
