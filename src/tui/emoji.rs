//! Emoji picker popup
//!
//! A small grid overlay. Picking an emoji only appends it to the pending
//! compose input; the picker has no other effect on the session.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// The selectable emoji, in grid order.
const EMOJI: &[&str] = &[
    "😀", "😂", "😊", "😍", "😎", "😢", "😮", "🤔",
    "👍", "👋", "🙏", "👀", "🎉", "🔥", "❤️", "💯",
];

/// Grid columns.
const COLS: usize = 8;

/// Popup dimensions.
const POPUP_WIDTH: u16 = 36;
const POPUP_HEIGHT: u16 = 6;

#[derive(Default)]
pub struct EmojiPickerState {
    pub open: bool,
    pub selected: usize,
}

impl EmojiPickerState {
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn move_left(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.selected + 1 < EMOJI.len() {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        if self.selected >= COLS {
            self.selected -= COLS;
        }
    }

    pub fn move_down(&mut self) {
        if self.selected + COLS < EMOJI.len() {
            self.selected += COLS;
        }
    }

    /// The currently selected emoji; closes the picker.
    pub fn pick(&mut self) -> &'static str {
        self.open = false;
        EMOJI[self.selected]
    }
}

/// Render the picker as a centered overlay above the compose box.
pub fn render_popup(frame: &mut Frame, state: &EmojiPickerState) {
    let area = frame.area();
    let popup = Rect::new(
        area.x + area.width.saturating_sub(POPUP_WIDTH) / 2,
        area.y + area.height.saturating_sub(POPUP_HEIGHT) / 2,
        POPUP_WIDTH.min(area.width),
        POPUP_HEIGHT.min(area.height),
    );

    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            " emoji  (Enter: insert, Esc: close) ",
            Style::default().fg(Color::Gray),
        ));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines: Vec<Line> = Vec::new();
    for (row_idx, row) in EMOJI.chunks(COLS).enumerate() {
        let mut spans: Vec<Span> = vec![Span::raw(" ")];
        for (col_idx, emoji) in row.iter().enumerate() {
            let idx = row_idx * COLS + col_idx;
            let style = if idx == state.selected {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {} ", emoji), style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
