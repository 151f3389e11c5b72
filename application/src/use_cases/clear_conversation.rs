//! Clear Conversation use case

use crate::ports::conversation_store::ConversationStore;
use crate::use_cases::shared::AskError;
use counsel_domain::{UserDirectory, UserId};
use std::sync::Arc;
use tracing::{error, info};

/// Use case for wiping one user's conversation memory
pub struct ClearConversationUseCase<S: ConversationStore + ?Sized + 'static> {
    store: Arc<S>,
    directory: Arc<UserDirectory>,
}

impl<S: ConversationStore + ?Sized + 'static> ClearConversationUseCase<S> {
    pub fn new(store: Arc<S>, directory: Arc<UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Clear the user's record. Unknown users are rejected without touching
    /// the store.
    pub async fn execute(&self, user: &str) -> Result<UserId, AskError> {
        let (user, _) = self.directory.resolve(user)?;

        self.store.clear(&user).await.map_err(|e| {
            error!(user = %user, "Failed to persist conversation clear: {}", e);
            AskError::from(e)
        })?;

        info!(user = %user, "Conversation history cleared");
        Ok(user)
    }
}
