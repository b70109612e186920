//! Checkpoint creation screens

use super::dialogs::render_title;
use super::{frame_layout, help_line, outcome_line, View};
use crate::tui::navigation::{
    CustomDraft, ListCursor, SuggestionFlow, CREATE_OPTIONS, SUGGESTION_ERROR_OPTIONS,
};
use crate::tui::pages::timeline::input_preview;
use crate::tui::theme::icons;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn menu_lines<'a>(view: &View<'_>, options: &[&'a str], cursor: &ListCursor) -> Vec<Line<'a>> {
    let theme = view.theme;
    cursor
        .window(options.len())
        .map(|i| {
            if i == cursor.selected {
                Line::from(vec![
                    Span::styled(format!("{} ", icons::PROMPT), theme.text_accent()),
                    Span::styled(options[i], theme.text_bold()),
                ])
                .style(theme.selected())
            } else {
                Line::from(vec![Span::raw("  "), Span::styled(options[i], theme.text())])
            }
        })
        .collect()
}

fn bordered<'a>(view: &View<'_>, title: &'a str, lines: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled(title, view.theme.text_bold()))
            .borders(Borders::ALL)
            .border_style(view.theme.border_focused()),
    )
}

pub fn render_menu(
    frame: &mut Frame,
    area: Rect,
    view: &View<'_>,
    cursor: &ListCursor,
    busy: bool,
    error: Option<&str>,
) {
    let theme = view.theme;
    let [title, body, help] = frame_layout(area);
    render_title(frame, title, view, "New checkpoint");

    let mut lines = menu_lines(view, &CREATE_OPTIONS, cursor);
    lines.push(Line::default());
    match view.latest_input {
        Some(input) => lines.push(Line::from(vec![
            Span::styled("Last input: ", theme.text_muted()),
            Span::styled(input_preview(&input.text), theme.text()),
        ])),
        None => lines.push(Line::styled(
            "No conversation input yet; \"Checkpoint\" will be used.",
            theme.text_muted(),
        )),
    }
    lines.extend(outcome_line(view, busy, error));

    frame.render_widget(bordered(view, " How should it be described? ", lines), body);
    frame.render_widget(
        Paragraph::new(help_line(
            theme,
            &[("↑↓", "move"), ("enter", "choose"), ("esc", "back")],
        )),
        help,
    );
}

/// Text field with a trailing cursor block
fn field_line(view: &View<'_>, text: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{} ", icons::PROMPT), view.theme.text_accent()),
        Span::styled(text.to_string(), view.theme.text()),
        Span::styled("█", view.theme.text_accent()),
    ])
}

pub fn render_label(
    frame: &mut Frame,
    area: Rect,
    view: &View<'_>,
    draft: &CustomDraft,
    error: Option<&str>,
) {
    let theme = view.theme;
    let [title, body, help] = frame_layout(area);
    render_title(frame, title, view, "New checkpoint");

    let mut lines = vec![field_line(view, &draft.label)];
    if view.options.custom_prefix_enabled {
        lines.push(Line::styled(
            "Saved as \"Vibe: <label>\"",
            theme.text_muted(),
        ));
    }
    lines.extend(outcome_line(view, false, error));

    frame.render_widget(bordered(view, " Label ", lines), body);
    frame.render_widget(
        Paragraph::new(help_line(theme, &[("enter", "next"), ("esc", "back")])),
        help,
    );
}

pub fn render_description(
    frame: &mut Frame,
    area: Rect,
    view: &View<'_>,
    draft: &CustomDraft,
    busy: bool,
    error: Option<&str>,
) {
    let theme = view.theme;
    let [title, body, help] = frame_layout(area);
    render_title(frame, title, view, &format!("New checkpoint: {}", draft.label));

    let mut lines = vec![
        field_line(view, &draft.description),
        Line::styled("Optional; leave empty to skip", theme.text_muted()),
    ];
    lines.extend(outcome_line(view, busy, error));

    frame.render_widget(bordered(view, " Description ", lines), body);
    frame.render_widget(
        Paragraph::new(help_line(theme, &[("enter", "save"), ("esc", "back")])),
        help,
    );
}

pub fn render_suggestions(frame: &mut Frame, area: Rect, view: &View<'_>, flow: &SuggestionFlow) {
    let theme = view.theme;
    let [title, body, help] = frame_layout(area);
    render_title(frame, title, view, "Suggested messages");

    match flow {
        SuggestionFlow::Loading { .. } => {
            let line = Line::styled(
                format!(
                    "{} Asking the assistant for suggestions...",
                    icons::SPINNER[view.spinner % icons::SPINNER.len()]
                ),
                theme.warning(),
            );
            frame.render_widget(bordered(view, " Suggestions ", vec![line]), body);
            frame.render_widget(Paragraph::new(help_line(theme, &[("esc", "back")])), help);
        }

        SuggestionFlow::Suggestions {
            set,
            cursor,
            busy,
            error,
        } => {
            let mut lines = Vec::new();
            for i in cursor.window(set.suggestions.len()) {
                let suggestion = &set.suggestions[i];
                let selected = i == cursor.selected;
                let marker = if selected { icons::PROMPT } else { " " };
                let header = Line::from(vec![
                    Span::styled(format!("{} ", marker), theme.text_accent()),
                    Span::styled(format!("[{}]", suggestion.kind.label()), theme.text_muted()),
                ]);
                let message = Line::styled(
                    format!("  {}", suggestion.message.lines().next().unwrap_or_default()),
                    if selected { theme.selected() } else { theme.text() },
                );
                lines.push(header);
                lines.push(message);
            }
            if let Some((kind, e)) = &set.partial {
                lines.push(Line::default());
                lines.push(Line::styled(
                    format!("{} {} suggestion unavailable: {}", icons::WARNING, kind.label(), e),
                    theme.warning(),
                ));
            }
            lines.extend(outcome_line(view, *busy, error.as_deref()));

            frame.render_widget(bordered(view, " Suggestions ", lines), body);
            frame.render_widget(
                Paragraph::new(help_line(
                    theme,
                    &[
                        ("↑↓", "move"),
                        ("enter", "use"),
                        ("r", "regenerate"),
                        ("esc", "back"),
                    ],
                )),
                help,
            );
        }

        SuggestionFlow::Error { error, cursor } => {
            let mut lines = vec![
                Line::styled(
                    format!("{} No suggestions could be generated", icons::CROSS),
                    theme.error(),
                ),
                Line::styled(error.clone(), theme.text()),
                Line::default(),
            ];
            lines.extend(menu_lines(view, &SUGGESTION_ERROR_OPTIONS, cursor));

            frame.render_widget(bordered(view, " Suggestions ", lines), body);
            frame.render_widget(
                Paragraph::new(help_line(
                    theme,
                    &[("↑↓", "move"), ("enter", "choose"), ("esc", "back")],
                )),
                help,
            );
        }
    }
}
