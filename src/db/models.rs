use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

pub const MAX_SENDER_LEN: usize = 50;
pub const MAX_TEXT_LEN: usize = 2000;

/// One stored message. `timestamp` is a UTC string with microsecond
/// precision; it sorts lexicographically in chronological order and is the
/// sole sort key for retrieval.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub text: String,
    pub image_url: String,
    pub timestamp: String,
    pub user_id: String,
}

/// A validated message submission, before the repository assigns `id` and
/// `timestamp`. `user_id` always comes from the authenticated session.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender: String,
    pub text: String,
    pub image_url: String,
    pub user_id: String,
}

impl NewMessage {
    pub fn new(
        sender: String,
        text: String,
        image_url: String,
        user_id: String,
    ) -> Result<Self, AppError> {
        // Caps count characters, not bytes; multi-byte senders and text fit.
        if sender.is_empty() || sender.chars().count() > MAX_SENDER_LEN {
            return Err(AppError::Validation(format!(
                "Sender must be 1-{} characters.",
                MAX_SENDER_LEN
            )));
        }
        if text.chars().count() > MAX_TEXT_LEN {
            return Err(AppError::Validation(format!(
                "Message text must be at most {} characters.",
                MAX_TEXT_LEN
            )));
        }
        if user_id.is_empty() {
            return Err(AppError::Internal("Message owner missing.".to_string()));
        }
        Ok(Self {
            sender,
            text,
            image_url,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_empty_text() {
        let msg = NewMessage::new(
            "iPhone".into(),
            String::new(),
            String::new(),
            "user-1".into(),
        )
        .unwrap();
        assert_eq!(msg.text, "");
        assert_eq!(msg.image_url, "");
    }

    #[test]
    fn rejects_oversized_text() {
        let err = NewMessage::new(
            "PC".into(),
            "x".repeat(MAX_TEXT_LEN + 1),
            String::new(),
            "user-1".into(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn caps_count_characters_not_bytes() {
        // 4 bytes per char; fits by character count.
        let msg = NewMessage::new(
            "📱".repeat(MAX_SENDER_LEN),
            "好".repeat(MAX_TEXT_LEN),
            String::new(),
            "user-1".into(),
        )
        .unwrap();
        assert_eq!(msg.sender.chars().count(), MAX_SENDER_LEN);

        assert!(NewMessage::new(
            "📱".repeat(MAX_SENDER_LEN + 1),
            String::new(),
            String::new(),
            "user-1".into()
        )
        .is_err());
        assert!(NewMessage::new(
            "PC".into(),
            "好".repeat(MAX_TEXT_LEN + 1),
            String::new(),
            "user-1".into()
        )
        .is_err());
    }

    #[test]
    fn rejects_empty_and_oversized_sender() {
        assert!(NewMessage::new(String::new(), "hi".into(), String::new(), "u".into()).is_err());
        assert!(NewMessage::new(
            "s".repeat(MAX_SENDER_LEN + 1),
            "hi".into(),
            String::new(),
            "u".into()
        )
        .is_err());
    }
}
