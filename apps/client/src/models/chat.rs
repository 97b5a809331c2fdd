use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::user::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnText {
    #[serde(default)]
    pub text: String,
    /// Naive UTC, as written by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    /// Local-only marker for a reply that is still being generated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_typing: bool,
}

impl TurnText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: None,
            is_typing: false,
        }
    }

    pub fn typing() -> Self {
        Self {
            text: String::new(),
            timestamp: None,
            is_typing: true,
        }
    }
}

/// One user message and the mentor's reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TurnText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<TurnText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<ChatTurn>,
}

/// Answer to `POST /chat`. `history` already contains the new turn.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_parses_backend_timestamps() {
        let history: ChatHistory = serde_json::from_value(json!({
            "history": [{
                "id": "8d1c",
                "user": { "text": "I like maths", "timestamp": "2025-03-02T10:15:30.123456" },
                "ai": { "text": "Have you considered actuarial work?", "timestamp": "2025-03-02T10:15:30.123456" }
            }]
        }))
        .unwrap();

        let turn = &history.history[0];
        assert_eq!(turn.id, "8d1c");
        assert!(turn.user.as_ref().unwrap().timestamp.is_some());
        assert!(!turn.ai.as_ref().unwrap().is_typing);
    }

    #[test]
    fn test_reply_tolerates_missing_fields() {
        let reply: ChatReply = serde_json::from_value(json!({
            "history": [{ "id": "t1", "user": { "text": "hi" } }],
            "turn": { "id": "t1" }
        }))
        .unwrap();
        assert_eq!(reply.reply, "");
        assert_eq!(reply.history.len(), 1);

        let reply: ChatReply = serde_json::from_value(json!({ "reply": "Hello!", "history": null })).unwrap();
        assert_eq!(reply.reply, "Hello!");
        assert!(reply.history.is_empty());
    }
}
