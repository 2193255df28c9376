//! Session gate: validates a display name and room code and produces the
//! immutable participant identity used for the rest of the session.
//!
//! The gate itself does no persistence and no network I/O.

use crate::models::RoomCode;

/// The identity fixed at join time. Transient and client-side only; held for
/// the lifetime of the joined state and never persisted.
#[derive(Debug, Clone)]
pub struct Participant {
    pub name: String,
    pub room: RoomCode,
}

/// Sanitize a candidate room code: strip non-digit characters and truncate
/// to six. Applied on every keystroke, so the stored candidate is always a
/// digit prefix of length <= 6.
pub fn sanitize_room_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(6)
        .collect()
}

/// In-progress join form state.
///
/// `name` holds the raw candidate name (untrimmed), `code` the sanitized
/// candidate room code.
#[derive(Debug, Default, Clone)]
pub struct JoinForm {
    pub name: String,
    pub code: String,
}

impl JoinForm {
    /// Append a character to the name field.
    pub fn push_name_char(&mut self, c: char) {
        self.name.push(c);
    }

    /// Replace the code field with the sanitized version of `raw`.
    #[allow(dead_code)]
    pub fn set_code(&mut self, raw: &str) {
        self.code = sanitize_room_code(raw);
    }

    /// Append a character to the code field, re-sanitizing the result.
    pub fn push_code_char(&mut self, c: char) {
        let mut raw = self.code.clone();
        raw.push(c);
        self.code = sanitize_room_code(&raw);
    }

    pub fn pop_name_char(&mut self) {
        self.name.pop();
    }

    pub fn pop_code_char(&mut self) {
        self.code.pop();
    }

    /// Whether the join action is enabled: non-empty name and a code of
    /// exactly six digits.
    pub fn can_join(&self) -> bool {
        !self.name.is_empty() && self.code.len() == 6
    }

    /// Attempt the join. Returns the fixed participant pair on success;
    /// `None` (a silent no-op, no error surfaced) when the form is
    /// incomplete.
    pub fn try_join(&self) -> Option<Participant> {
        if !self.can_join() {
            return None;
        }
        let room = RoomCode::parse(&self.code)?;
        Some(Participant {
            name: self.name.clone(),
            room,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_and_truncates() {
        assert_eq!(sanitize_room_code("12a3b45678"), "123456");
        assert_eq!(sanitize_room_code("abc"), "");
        assert_eq!(sanitize_room_code("12 34"), "1234");
        assert_eq!(sanitize_room_code("9876543210"), "987654");
        assert_eq!(sanitize_room_code(""), "");
    }

    #[test]
    fn test_sanitized_is_always_digit_prefix() {
        for raw in ["", "x", "1", "1x2y3z4w5v6u7t", "!!!!!!!!", "000000000"] {
            let s = sanitize_room_code(raw);
            assert!(s.len() <= 6);
            assert!(s.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_join_enabled_iff_name_and_full_code() {
        let mut form = JoinForm::default();
        assert!(!form.can_join());

        form.name = "Ann".to_string();
        form.set_code("42");
        assert!(!form.can_join());

        form.set_code("424242");
        assert!(form.can_join());

        form.name.clear();
        assert!(!form.can_join());
    }

    #[test]
    fn test_try_join_is_noop_when_incomplete() {
        let mut form = JoinForm::default();
        form.name = "Ann".to_string();
        form.set_code("42");
        assert!(form.try_join().is_none());
        // The form itself is untouched by the failed attempt.
        assert_eq!(form.code, "42");
    }

    #[test]
    fn test_try_join_fixes_participant_pair() {
        let mut form = JoinForm::default();
        // Untrimmed names are accepted as-is.
        form.name = "  Ann ".to_string();
        form.set_code("1x2y3z4w5v6");
        assert_eq!(form.code, "123456");

        let participant = form.try_join().unwrap();
        assert_eq!(participant.name, "  Ann ");
        assert_eq!(participant.room.as_str(), "123456");
    }

    #[test]
    fn test_push_code_char_sanitizes_on_keystroke() {
        let mut form = JoinForm::default();
        for c in "12a3b45678".chars() {
            form.push_code_char(c);
        }
        assert_eq!(form.code, "123456");
    }
}
