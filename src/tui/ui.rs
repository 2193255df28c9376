//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::app::{App, View};
use super::compose;
use super::emoji;
use super::join;
use super::messages;

/// Main render function
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Layout: header (1 line) + main content + status bar (1 line)
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    match app.view {
        View::Join => {
            join::render(main_area, frame, &app.join);
        }
        View::Room => {
            let [messages_area, compose_area] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(compose::COMPOSE_HEIGHT),
            ])
            .areas(main_area);

            let room_code = app
                .participant
                .as_ref()
                .map(|p| p.room.to_string())
                .unwrap_or_default();
            messages::render(messages_area, frame.buffer_mut(), &mut app.messages, &room_code);
            compose::render(compose_area, frame, &app.compose);

            // Emoji picker overlay on top of the room view.
            if app.emoji.open {
                emoji::render_popup(frame, &app.emoji);
            }
        }
    }

    render_status(status_area, frame.buffer_mut(), app);
}

/// Render the header bar
fn render_header(area: Rect, buf: &mut Buffer, app: &App) {
    let title = Span::styled(
        " InboX",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let right_text = match app.participant.as_ref() {
        Some(p) => format!(" {} @ {} ", p.name, p.room),
        None => " not joined ".to_string(),
    };
    let right = Span::styled(right_text.clone(), Style::default().fg(Color::Cyan));

    let left_width = " InboX".len();
    let right_width = unicode_width::UnicodeWidthStr::width(right_text.as_str());
    let padding_width = area
        .width
        .saturating_sub((left_width + right_width) as u16)
        as usize;

    let header_line = Line::from(vec![title, Span::raw(" ".repeat(padding_width)), right]);
    Paragraph::new(header_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Render the status bar
fn render_status(area: Rect, buf: &mut Buffer, app: &App) {
    // The newest captured log line takes over the bar when present, so
    // otherwise-silent storage failures are still visible somewhere.
    if let Some(ref line) = app.last_log {
        Paragraph::new(Line::from(Span::styled(
            format!(" {} ", line),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        )))
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
        return;
    }

    let backend = Span::styled(
        format!(" {} ", app.backend_label),
        Style::default().fg(Color::Green),
    );
    let sep_style = Style::default().fg(Color::DarkGray);

    let hints = match app.view {
        View::Join => "Tab: switch field | Enter: join | Esc: quit",
        View::Room => "Enter: send | C-e: emoji | Up/Down: scroll | Esc: leave",
    };
    let hint_span = Span::styled(hints, Style::default().fg(Color::Gray));

    let status_line = Line::from(vec![backend, Span::styled("| ", sep_style), hint_span]);
    Paragraph::new(status_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}
