//! Compose box: single-line text input with cursor editing.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};

/// State for the compose box.
#[derive(Default)]
pub struct ComposeState {
    /// Current pending input text.
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
}

impl ComposeState {
    /// Insert a character at the current cursor position.
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    /// Insert a string (e.g. a picked emoji) at the current cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert_str(byte_pos, s);
        self.cursor_pos += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let prev_byte_pos = self.char_to_byte(self.cursor_pos - 1);
            self.input.drain(prev_byte_pos..byte_pos);
            self.cursor_pos -= 1;
        }
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let next_byte_pos = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(byte_pos..next_byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
        }
    }

    pub fn move_right(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            self.cursor_pos += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    /// Clear all input text (Ctrl+U).
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    /// Take the pending text for sending: returns the trimmed text and
    /// clears the box. Whitespace-only input returns `None` and leaves the
    /// box unchanged. The clear happens before any network work, so the
    /// input is empty regardless of how the send turns out.
    pub fn take_for_send(&mut self) -> Option<String> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.input.clear();
        self.cursor_pos = 0;
        Some(text)
    }

    /// Convert a char-based cursor position to a byte offset.
    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Height of the compose box: 1 border + 1 input + 1 border.
pub const COMPOSE_HEIGHT: u16 = 3;

/// Render the compose box into the given area and position the cursor.
pub fn render(area: Rect, frame: &mut Frame, state: &ComposeState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " message  (Enter: send, C-e: emoji) ",
            Style::default().fg(Color::DarkGray),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let input_area = Rect::new(inner.x, inner.y, inner.width, 1);
    let cursor = compute_cursor_position(input_area, state);
    render_input(input_area, frame.buffer_mut(), state);

    if let Some((cx, cy)) = cursor {
        frame.set_cursor_position((cx, cy));
    }
}

fn compute_cursor_position(input_area: Rect, state: &ComposeState) -> Option<(u16, u16)> {
    if state.input.is_empty() {
        Some((input_area.x + 1, input_area.y))
    } else {
        let w = input_area.width as usize;
        let display = display_window(&state.input, state.cursor_pos, w);
        Some((input_area.x + 1 + display.cursor_offset as u16, input_area.y))
    }
}

/// Render the input line (with placeholder or text).
fn render_input(area: Rect, buf: &mut Buffer, state: &ComposeState) {
    let w = area.width as usize;

    if state.input.is_empty() {
        let placeholder = " Type message here";
        let truncated: String = placeholder.chars().take(w).collect();
        Paragraph::new(Line::from(Span::styled(
            truncated,
            Style::default().fg(Color::DarkGray),
        )))
        .render(area, buf);
    } else {
        let display = display_window(&state.input, state.cursor_pos, w);
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", display.visible),
            Style::default().fg(Color::White),
        )))
        .render(area, buf);
    }
}

struct DisplayWindow {
    visible: String,
    cursor_offset: usize,
}

/// Horizontal scrolling: compute the visible slice of the input that keeps
/// the cursor on screen.
fn display_window(input: &str, cursor_pos: usize, width: usize) -> DisplayWindow {
    let avail = width.saturating_sub(1);
    if avail == 0 {
        return DisplayWindow {
            visible: String::new(),
            cursor_offset: 0,
        };
    }

    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= avail {
        return DisplayWindow {
            visible: input.to_string(),
            cursor_offset: cursor_pos,
        };
    }

    let scroll_start = if cursor_pos < avail {
        0
    } else {
        cursor_pos - avail + 1
    };
    let end = (scroll_start + avail).min(chars.len());
    DisplayWindow {
        visible: chars[scroll_start..end].iter().collect(),
        cursor_offset: cursor_pos - scroll_start,
    }
}
