//! Message-related models

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::RoomCode;

/// A chat message as stored in the shared `messages` collection.
///
/// Immutable once inserted; the client only ever holds read-only copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    /// RFC 3339 UTC timestamp with millisecond precision. Fixed precision
    /// and a trailing `Z` keep lexicographic order chronological.
    pub timestamp: String,
    pub room_code: String,
    pub author: String,
}

impl Message {
    /// Build a new message stamped with the current time.
    pub fn new(text: &str, room: &RoomCode, author: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            room_code: room.as_str().to_string(),
            author: author.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_tags_room_and_author() {
        let room = RoomCode::parse("123456").unwrap();
        let msg = Message::new("hi", &room, "Alice");
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.room_code, "123456");
        assert_eq!(msg.author, "Alice");
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let room = RoomCode::parse("123456").unwrap();
        let msg = Message::new("hi", &room, "Alice");
        assert!(msg.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
    }

    #[test]
    fn test_timestamps_sort_lexicographically() {
        // Millisecond precision plus the Z suffix means string order is
        // chronological order.
        let a = "2026-08-06T10:00:00.000Z";
        let b = "2026-08-06T10:00:00.001Z";
        let c = "2026-08-06T10:00:01.000Z";
        assert!(a < b && b < c);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let room = RoomCode::parse("424242").unwrap();
        let msg = Message::new("hello", &room, "Bob");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["roomCode"], "424242");
        assert!(json.get("room_code").is_none());
    }
}
