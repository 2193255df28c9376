//! Join view: the session gate form.
//!
//! Two fields (display name, 6-digit room code) and a join affordance that
//! stays disabled until the gate's validation passes. The code field is
//! sanitized on every keystroke.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::session::JoinForm;

/// Which form field has focus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    #[default]
    Name,
    Code,
}

/// State for the join view.
#[derive(Default)]
pub struct JoinState {
    pub form: JoinForm,
    pub focus: Field,
}

impl JoinState {
    pub fn with_name(name: Option<String>) -> Self {
        let mut state = Self::default();
        if let Some(name) = name {
            state.form.name = name;
        }
        state
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Field::Name => Field::Code,
            Field::Code => Field::Name,
        };
    }

    /// Route a typed character to the focused field. The code field strips
    /// non-digits and truncates to six as part of the keystroke.
    pub fn push_char(&mut self, c: char) {
        match self.focus {
            Field::Name => self.form.push_name_char(c),
            Field::Code => self.form.push_code_char(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Field::Name => self.form.pop_name_char(),
            Field::Code => self.form.pop_code_char(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

const FORM_WIDTH: u16 = 44;
const FORM_HEIGHT: u16 = 11;

/// Render the join form centered in the given area.
pub fn render(area: Rect, frame: &mut Frame, state: &JoinState) {
    let form_area = Rect::new(
        area.x + area.width.saturating_sub(FORM_WIDTH) / 2,
        area.y + area.height.saturating_sub(FORM_HEIGHT) / 2,
        FORM_WIDTH.min(area.width),
        FORM_HEIGHT.min(area.height),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " InboX ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    if inner.height < 8 || inner.width < 10 {
        return;
    }

    let name_focused = state.focus == Field::Name;
    let code_focused = state.focus == Field::Code;

    render_label(frame, inner, 0, "Enter Name");
    render_field(frame, inner, 1, &state.form.name, "Enter your name", name_focused);

    render_label(frame, inner, 3, "Enter Room Code");
    render_field(
        frame,
        inner,
        4,
        &state.form.code,
        "Enter 6-digit room code",
        code_focused,
    );
    render_hint(frame, inner, 5, "Room code must be 6 digits");

    // Join affordance: highlighted when the gate would accept, dimmed
    // otherwise (attempting to join while dimmed is a silent no-op).
    let join_style = if state.form.can_join() {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let join_area = Rect::new(inner.x, inner.y + 7, inner.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled("  [ Join ]", join_style))),
        join_area,
    );

    // Cursor in the focused field.
    let (row, text) = if name_focused {
        (1, &state.form.name)
    } else {
        (4, &state.form.code)
    };
    let cursor_x = inner.x + 2 + text.chars().count().min(inner.width as usize - 3) as u16;
    frame.set_cursor_position((cursor_x, inner.y + row));
}

fn render_label(frame: &mut Frame, inner: Rect, row: u16, label: &str) {
    let area = Rect::new(inner.x, inner.y + row, inner.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", label),
            Style::default().fg(Color::Gray),
        ))),
        area,
    );
}

fn render_field(
    frame: &mut Frame,
    inner: Rect,
    row: u16,
    value: &str,
    placeholder: &str,
    focused: bool,
) {
    let area = Rect::new(inner.x, inner.y + row, inner.width, 1);
    let line = if value.is_empty() {
        Line::from(Span::styled(
            format!("  {}", placeholder),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let style = if focused {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray)
        };
        Line::from(Span::styled(format!("  {}", value), style))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_hint(frame: &mut Frame, inner: Rect, row: u16, hint: &str) {
    let area = Rect::new(inner.x, inner.y + row, inner.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!("  {}", hint),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        ))),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_char_sanitizes_code_field() {
        let mut state = JoinState::default();
        state.focus = Field::Code;
        for c in "12a3b45678".chars() {
            state.push_char(c);
        }
        assert_eq!(state.form.code, "123456");
    }

    #[test]
    fn test_name_field_accepts_anything() {
        let mut state = JoinState::with_name(None);
        for c in "Ann 42!".chars() {
            state.push_char(c);
        }
        assert_eq!(state.form.name, "Ann 42!");
    }

    #[test]
    fn test_focus_cycles_between_fields() {
        let mut state = JoinState::default();
        assert_eq!(state.focus, Field::Name);
        state.focus_next();
        assert_eq!(state.focus, Field::Code);
        state.focus_next();
        assert_eq!(state.focus, Field::Name);
    }
}
