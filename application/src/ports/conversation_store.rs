//! Conversation store port
//!
//! Durable, per-user, append-only conversation memory. The store is keyed
//! by user: records of distinct users never interfere, and mutations to
//! the same user's record are serialized by the implementation.

use async_trait::async_trait;
use counsel_domain::{ChatTurn, ConversationRecord, Message, PromptTemplate, RoleLabel, UserId};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by conversation store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence failed: {0}")]
    Persistence(String),
}

/// The (system instruction, history) pair handed to a responder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    pub system_instruction: String,
    /// Prior turns only; the in-flight question is appended by the caller.
    pub history: Vec<ChatTurn>,
}

impl ConversationContext {
    /// The full conversation for a responder call: history plus the new question.
    pub fn with_question(mut self, question: &str) -> (String, Vec<ChatTurn>) {
        self.history.push(ChatTurn::user(question));
        (self.system_instruction, self.history)
    }
}

/// Durable per-user conversation memory
///
/// Every mutating method persists before returning `Ok`. When persistence
/// fails the in-memory record still reflects the mutation and the error is
/// returned so the caller can log it.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one message to the user's record.
    async fn append(&self, user: &UserId, message: Message) -> Result<(), StoreError>;

    /// Append both halves of a completed turn in a single per-user critical
    /// section, so no other write for this user can land between them.
    async fn append_turn(
        &self,
        user: &UserId,
        question: Message,
        answer: Message,
    ) -> Result<(), StoreError>;

    /// Current record in arrival order; empty for an unseen user.
    async fn history(&self, user: &UserId) -> Vec<Message>;

    /// Remove the user's record atomically.
    async fn clear(&self, user: &UserId) -> Result<(), StoreError>;

    /// Every record in the persisted `user -> [{role, content, timestamp}]` layout.
    async fn export_snapshot(&self) -> BTreeMap<String, Vec<Message>>;

    async fn append_user(&self, user: &UserId, text: &str) -> Result<(), StoreError> {
        self.append(user, Message::user(text)).await
    }

    async fn append_assistant(&self, user: &UserId, text: &str) -> Result<(), StoreError> {
        self.append(user, Message::assistant(text)).await
    }

    /// Compose the system instruction and return the prior history.
    ///
    /// `history_limit` keeps only the most recent messages, for backends
    /// with small context windows.
    async fn build_context(
        &self,
        user: &UserId,
        role: &RoleLabel,
        history_limit: Option<usize>,
    ) -> ConversationContext {
        let record = ConversationRecord::from(self.history(user).await);
        ConversationContext {
            system_instruction: PromptTemplate::counselor_system(user, role),
            history: record.turns(history_limit),
        }
    }
}
