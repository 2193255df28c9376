//! Messages pane: the room's message list, oldest first.

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::models::Message;

/// State for the messages pane.
pub struct MessagesState {
    /// Current snapshot, oldest first. Replaced wholesale on every sync.
    pub messages: Vec<Message>,
    /// Vertical scroll offset in rendered lines (0 = top).
    pub scroll_offset: usize,
    /// Whether the view follows the newest message. Scrolling up detaches;
    /// scrolling back to the bottom re-attaches.
    pub follow: bool,
}

impl MessagesState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            scroll_offset: 0,
            follow: true,
        }
    }

    /// Replace the snapshot with a fresh scoped read result.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
        // Clamping against the real bottom happens at render time; follow is
        // re-enabled there once the bottom is reached.
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.scroll_offset = 0;
        self.follow = true;
    }
}

/// Render an RFC 3339 timestamp as local wall-clock time. Unparseable
/// timestamps are shown verbatim.
fn format_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.with_timezone(&Local).format("%H:%M").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the messages pane.
pub fn render(area: Rect, buf: &mut Buffer, state: &mut MessagesState, room_code: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" InboX - {} ", room_code),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if state.messages.is_empty() {
        Paragraph::new(Line::from(Span::styled(
            " No messages yet",
            Style::default().fg(Color::DarkGray),
        )))
        .render(Rect::new(inner.x, inner.y, inner.width, 1), buf);
        return;
    }

    let all_lines = build_message_lines(&state.messages, inner.width as usize);
    let total_lines = all_lines.len();
    let visible_height = inner.height as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);

    // Follow mode pins the viewport to the newest message; manual scrolling
    // past the bottom re-enables it.
    if state.scroll_offset >= max_scroll {
        state.scroll_offset = max_scroll;
        state.follow = true;
    }
    if state.follow {
        state.scroll_offset = max_scroll;
    }
    let scroll = state.scroll_offset;

    for (row, line_idx) in (scroll..total_lines).take(visible_height).enumerate() {
        let line_area = Rect::new(inner.x, inner.y + row as u16, inner.width, 1);
        Paragraph::new(all_lines[line_idx].clone()).render(line_area, buf);
    }

    // Scroll indicators.
    if total_lines > visible_height {
        let indicator_x = inner.x + inner.width.saturating_sub(1);
        if scroll > 0 {
            let cell = &mut buf[(indicator_x, inner.y)];
            cell.set_char('^');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
        if scroll < max_scroll {
            let bottom_y = inner.y + inner.height.saturating_sub(1);
            let cell = &mut buf[(indicator_x, bottom_y)];
            cell.set_char('v');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
    }
}

/// Flatten the snapshot into display lines: a header line per message plus
/// word-wrapped body lines, with a blank line between messages.
fn build_message_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let body_width = width.saturating_sub(3);

    for msg in messages {
        lines.push(Line::from(vec![
            Span::styled(
                format!(" {}", msg.author),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", format_timestamp(&msg.timestamp)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        for body_line in wrap_text(&msg.text, body_width) {
            lines.push(Line::from(Span::raw(format!("   {}", body_line))));
        }

        lines.push(Line::from(""));
    }

    lines
}

/// Simple word-wrapping: split content by newlines first, then wrap long
/// lines at word boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![];
    }
    let mut result = Vec::new();
    for line in text.lines() {
        if line.chars().count() <= max_width {
            result.push(line.to_string());
        } else {
            let words: Vec<&str> = line.split_whitespace().collect();
            let mut current = String::new();
            for word in words {
                if current.is_empty() {
                    current = word.to_string();
                } else if current.chars().count() + 1 + word.chars().count() <= max_width {
                    current.push(' ');
                    current.push_str(word);
                } else {
                    result.push(current);
                    current = word.to_string();
                }
            }
            if !current.is_empty() {
                result.push(current);
            }
        }
    }
    result
}
