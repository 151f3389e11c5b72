//! Non-durable conversation store

use super::shards::ConversationShards;
use async_trait::async_trait;
use counsel_application::{ConversationStore, StoreError};
use counsel_domain::{ConversationRecord, Message, UserId};
use std::collections::BTreeMap;

/// Conversation memory that lives only as long as the process.
#[derive(Default)]
pub struct InMemoryConversationStore {
    shards: ConversationShards,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append(&self, user: &UserId, message: Message) -> Result<(), StoreError> {
        self.shards.slot(user).lock().await.push(message);
        Ok(())
    }

    async fn append_turn(
        &self,
        user: &UserId,
        question: Message,
        answer: Message,
    ) -> Result<(), StoreError> {
        let slot = self.shards.slot(user);
        let mut record = slot.lock().await;
        record.push(question);
        record.push(answer);
        Ok(())
    }

    async fn history(&self, user: &UserId) -> Vec<Message> {
        self.shards.history(user).await
    }

    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        if let Some(slot) = self.shards.existing(user) {
            *slot.lock().await = ConversationRecord::new();
        }
        Ok(())
    }

    async fn export_snapshot(&self) -> BTreeMap<String, Vec<Message>> {
        self.shards.snapshot().await
    }
}
