//! UI rendering functions for the TUI.
//!
//! Implements the three-panel layout with note list, detail view, and search input
//! using ratatui widgets and layout management.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use time::{OffsetDateTime, macros::format_description};

use super::app::{App, Focus};
use crate::links::Segment;
use crate::models::ReferenceEdge;

/// Main rendering function for the TUI.
///
/// Draws the three-panel layout with note list, detail view, and search input.
/// Applies focus indicators and styling based on app state.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    // Search input at top, content in middle, shortcuts at bottom
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter input
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    // Note list (30%) | detail view (70%)
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    render_search_input(frame, app, main_chunks[0]);
    render_note_list(frame, app, content_chunks[0]);
    render_detail_view(frame, app, content_chunks[1]);
    render_shortcut_bar(frame, app, main_chunks[2]);
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
}

/// Renders the search input panel at the top of the screen.
fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::SearchInput);

    let mut content = app.search_input().to_string();
    if is_focused {
        content.push('█'); // Cursor indicator
    }

    let paragraph = Paragraph::new(content).block(panel("Search", is_focused));
    frame.render_widget(paragraph, area);
}

/// Renders the note list panel.
///
/// Each row shows the category glyph, the title and the last update date.
fn render_note_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::NoteList);

    let items: Vec<ListItem> = app
        .notes()
        .iter()
        .map(|note| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", note.category().glyph())),
                Span::raw(note.title().to_string()),
                Span::raw(" "),
                Span::styled(
                    format_date(note.updated_at()),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]))
        })
        .collect();

    let title = format!("Notes ({})", app.notes().len());
    let list = List::new(items)
        .block(panel(&title, is_focused))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::REVERSED),
        );

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Renders the selected note: header, linked content, tags and reference panels.
fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus(), Focus::DetailView);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(Color::DarkGray);

    let content = if let Some(note) = app.selected_note() {
        let mut text = Text::default();

        text.lines.push(Line::from(vec![
            Span::raw(format!("{} ", note.category().glyph())),
            Span::styled(note.title().to_string(), bold),
            Span::styled(format!("  {}", note.category().label()), muted),
        ]));
        if !note.tags().is_empty() {
            let tags: Vec<Span> = note
                .tags()
                .iter()
                .map(|tag| Span::styled(format!("#{tag} "), Style::default().fg(Color::Cyan)))
                .collect();
            text.lines.push(Line::from(tags));
        }
        text.lines.push(Line::from(""));

        text.lines
            .extend(content_lines(&app.selected_segments(), app.link_cursor()));

        if let Some(refs) = app.references() {
            text.lines.push(Line::from(""));
            text.lines.push(Line::from(Span::styled("References:", bold)));
            push_edges(&mut text, "→", &refs.outgoing);
            text.lines.push(Line::from(Span::styled("Referenced by:", bold)));
            push_edges(&mut text, "←", &refs.incoming);
        }

        text.lines.push(Line::from(""));
        text.lines.push(Line::from(vec![
            Span::styled("Updated:", bold),
            Span::raw(" "),
            Span::styled(format_datetime(note.updated_at()), muted),
        ]));

        text
    } else {
        Text::from("No note selected")
    };

    let paragraph = Paragraph::new(content)
        .block(panel("Detail", is_focused))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));

    frame.render_widget(paragraph, area);
}

/// Turns rendered segments into styled lines.
///
/// Resolved links are underlined, broken links are red and struck through,
/// and the link at `highlighted` (counting both kinds) is reversed.
fn content_lines(segments: &[Segment<'_>], highlighted: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans = Vec::new();
    let mut link_index = 0;

    for segment in segments {
        let link_style = |base: Style, index: usize| {
            if highlighted == Some(index) {
                base.add_modifier(Modifier::REVERSED)
            } else {
                base
            }
        };

        match segment {
            Segment::Empty => {}
            Segment::Text { text } => spans.push(Span::raw(text.clone())),
            Segment::Link { label, .. } => {
                let style = Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED);
                spans.push(Span::styled(label.clone(), link_style(style, link_index)));
                link_index += 1;
            }
            Segment::BrokenLink { label, .. } => {
                let style = Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::CROSSED_OUT);
                spans.push(Span::styled(label.clone(), link_style(style, link_index)));
                link_index += 1;
            }
            Segment::LineBreak => lines.push(Line::from(std::mem::take(&mut spans))),
        }
    }
    lines.push(Line::from(spans));
    lines
}

fn push_edges(text: &mut Text<'_>, arrow: &str, edges: &[ReferenceEdge]) {
    if edges.is_empty() {
        text.lines.push(Line::from(Span::styled(
            "  (none)",
            Style::default().fg(Color::DarkGray),
        )));
        return;
    }
    for edge in edges {
        text.lines.push(Line::from(format!(
            "  {arrow} {} {}",
            edge.peer.category.glyph(),
            edge.peer.title
        )));
    }
}

fn format_date(ts: OffsetDateTime) -> String {
    ts.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "????-??-??".to_string())
}

fn format_datetime(ts: OffsetDateTime) -> String {
    ts.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| "????-??-?? ??:??:??".to_string())
}

/// Renders the shortcut bar at the bottom of the screen.
///
/// Shows context-aware keyboard shortcuts based on current focus state.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut shortcuts = vec![("Tab", "next panel"), ("Esc", "reset")];
    match app.focus() {
        Focus::SearchInput => shortcuts.insert(0, ("Ctrl+C", "quit")),
        Focus::NoteList => {
            shortcuts.insert(0, ("q", "quit"));
            shortcuts.push(("j/k", "navigate"));
            shortcuts.push(("Enter", "open"));
        }
        Focus::DetailView => {
            shortcuts.insert(0, ("q", "quit"));
            shortcuts.push(("j/k", "scroll"));
            shortcuts.push(("n/p", "pick link"));
            shortcuts.push(("Enter", "follow"));
            shortcuts.push(("b", "back"));
        }
    }

    let mut spans = Vec::new();
    for (i, (key, action)) in shortcuts.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", sep_style));
        }
        spans.push(Span::styled(key, key_style));
        spans.push(Span::raw(format!(": {action}")));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
