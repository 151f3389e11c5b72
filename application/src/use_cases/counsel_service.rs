//! Counsel service
//!
//! The one object the transport layer talks to. It bundles the coordinator
//! handle with the store, directory and responder so that Ask, Clear,
//! History and Health share the same admission rules.

use crate::ports::conversation_store::ConversationStore;
use crate::ports::responder::Responder;
use crate::use_cases::batch_coordinator::{CoordinatorHandle, PendingAnswer};
use crate::use_cases::clear_conversation::ClearConversationUseCase;
use crate::use_cases::shared::{AskError, Outcome};
use chrono::{DateTime, Utc};
use counsel_domain::{Message, UserDirectory, UserId};
use serde::Serialize;
use std::sync::Arc;

/// Liveness summary for the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub model_loaded: bool,
    pub responder: String,
    pub pending: usize,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

pub struct CounselService {
    coordinator: CoordinatorHandle,
    store: Arc<dyn ConversationStore>,
    directory: Arc<UserDirectory>,
    responder: Arc<dyn Responder>,
    clear: ClearConversationUseCase<dyn ConversationStore>,
}

impl CounselService {
    pub fn new(
        coordinator: CoordinatorHandle,
        store: Arc<dyn ConversationStore>,
        directory: Arc<UserDirectory>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        let clear = ClearConversationUseCase::new(Arc::clone(&store), Arc::clone(&directory));
        Self {
            coordinator,
            store,
            directory,
            responder,
            clear,
        }
    }

    /// Submit a question and wait for its batch to answer it
    pub async fn ask(&self, user: &str, question: &str) -> Outcome {
        self.coordinator.ask(user, question).await
    }

    /// Admit a question without waiting for the answer
    pub fn submit(&self, user: &str, question: &str) -> Result<PendingAnswer, AskError> {
        self.coordinator.submit(user, question)
    }

    pub async fn clear(&self, user: &str) -> Result<UserId, AskError> {
        self.clear.execute(user).await
    }

    /// The stored conversation of a registered user
    pub async fn history(&self, user: &str) -> Result<(UserId, Vec<Message>), AskError> {
        let (user, _) = self.directory.resolve(user)?;
        let messages = self.store.history(&user).await;
        Ok((user, messages))
    }

    pub fn health(&self) -> HealthReport {
        let status = if self.coordinator.is_shutting_down() {
            "shutting_down"
        } else {
            "healthy"
        };
        HealthReport {
            status,
            model_loaded: self.responder.is_ready(),
            responder: self.responder.name().to_string(),
            pending: self.coordinator.pending(),
            timestamp: Utc::now(),
        }
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.coordinator
    }
}
