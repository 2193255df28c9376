//! Room code model
//!
//! A room is identified solely by its 6-digit code; there is no room entity
//! to create or close. The code is an ambient partition key over the message
//! collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A validated 6-digit numeric room code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse a candidate code. Accepts exactly six ASCII digits.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("'{}' is not a 6-digit room code", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_six_digits() {
        assert!(RoomCode::parse("123456").is_some());
        assert!(RoomCode::parse("000000").is_some());
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        assert!(RoomCode::parse("").is_none());
        assert!(RoomCode::parse("12345").is_none());
        assert!(RoomCode::parse("1234567").is_none());
        assert!(RoomCode::parse("12345a").is_none());
        assert!(RoomCode::parse("12 456").is_none());
        // Non-ASCII digits are not room code digits.
        assert!(RoomCode::parse("１２３４５６").is_none());
    }

    #[test]
    fn test_from_str_for_clap() {
        let code: RoomCode = "424242".parse().unwrap();
        assert_eq!(code.as_str(), "424242");
        assert!("42".parse::<RoomCode>().is_err());
    }
}
