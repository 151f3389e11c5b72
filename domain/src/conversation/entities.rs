//! Conversation domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored message in a user's conversation (Entity)
///
/// Serialized as `{role, content, timestamp}`, the persisted layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn at(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::at(Role::User, content, Utc::now())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::at(Role::Assistant, content, Utc::now())
    }
}

/// One entry of the history handed to a responder: no timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// A user's ordered, append-only message history (Entity)
///
/// Messages are kept strictly in arrival order. The only way to shrink a
/// record is to replace it wholesale (see `ConversationStore::clear`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationRecord {
    messages: Vec<Message>,
}

impl ConversationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// History as responder turns, optionally limited to the most recent `limit`.
    pub fn turns(&self, limit: Option<usize>) -> Vec<ChatTurn> {
        let skip = match limit {
            Some(limit) => self.messages.len().saturating_sub(limit),
            None => 0,
        };
        self.messages[skip..].iter().map(ChatTurn::from).collect()
    }
}

impl From<Vec<Message>> for ConversationRecord {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl From<ConversationRecord> for Vec<Message> {
    fn from(record: ConversationRecord) -> Self {
        record.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_message_layout() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let msg = Message::at(Role::User, "hello", ts);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hello");
        assert_eq!(value["timestamp"], "2025-05-01T12:00:00Z");
    }

    #[test]
    fn test_record_preserves_order() {
        let mut record = ConversationRecord::new();
        record.push(Message::user("a"));
        record.push(Message::assistant("b"));
        record.push(Message::user("a"));

        let contents: Vec<_> = record.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "a"]);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_turns_limit_keeps_most_recent() {
        let record: ConversationRecord = vec![
            Message::user("q1"),
            Message::assistant("a1"),
            Message::user("q2"),
            Message::assistant("a2"),
        ]
        .into();

        let all = record.turns(None);
        assert_eq!(all.len(), 4);

        let recent = record.turns(Some(3));
        assert_eq!(
            recent,
            vec![
                ChatTurn::assistant("a1"),
                ChatTurn::user("q2"),
                ChatTurn::assistant("a2"),
            ]
        );

        assert_eq!(record.turns(Some(10)).len(), 4);
    }
}
