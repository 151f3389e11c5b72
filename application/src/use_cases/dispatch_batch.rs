//! Dispatch Batch use case
//!
//! Runs one closed batch: every item is answered concurrently, and the
//! outcomes come back in batch order so the coordinator can pair them
//! with completion handles by position.

use crate::config::DispatchParams;
use crate::ports::batch_dispatcher::{BatchDispatchError, BatchDispatcher, BatchItem};
use crate::ports::conversation_store::ConversationStore;
use crate::ports::responder::{Responder, ResponderError};
use crate::use_cases::shared::{AskError, Outcome};
use async_trait::async_trait;
use counsel_domain::{Message, Role};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Use case for running a batch of questions against the responder
pub struct DispatchBatchUseCase<R, S>
where
    R: Responder + ?Sized + 'static,
    S: ConversationStore + ?Sized + 'static,
{
    responder: Arc<R>,
    store: Arc<S>,
    params: DispatchParams,
}

impl<R, S> DispatchBatchUseCase<R, S>
where
    R: Responder + ?Sized + 'static,
    S: ConversationStore + ?Sized + 'static,
{
    pub fn new(responder: Arc<R>, store: Arc<S>) -> Self {
        Self {
            responder,
            store,
            params: DispatchParams::default(),
        }
    }

    pub fn with_params(mut self, params: DispatchParams) -> Self {
        self.params = params;
        self
    }

    /// Answer every item concurrently; one outcome per item, in batch order.
    ///
    /// Items run on their own tasks so a slow, failing or panicking item
    /// never holds back or aborts its siblings. The batch as a whole only
    /// returns once every item has finished.
    pub async fn run(&self, batch: Vec<BatchItem>) -> Vec<Outcome> {
        let batch_size = batch.len();
        info!("Dispatching batch of {} request(s)", batch_size);

        let handles: Vec<_> = batch
            .into_iter()
            .map(|item| {
                let responder = Arc::clone(&self.responder);
                let store = Arc::clone(&self.store);
                let params = self.params.clone();
                tokio::spawn(async move {
                    Self::answer_one(responder.as_ref(), store.as_ref(), &params, item).await
                })
            })
            .collect();

        let outcomes: Vec<Outcome> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Dispatch task failed: {}", e);
                    Err(AskError::BatchDispatchFailure(format!(
                        "dispatch task failed: {}",
                        e
                    )))
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        info!(
            "Batch finished: {} answered, {} failed",
            batch_size - failed,
            failed
        );
        outcomes
    }

    /// Answer a single item.
    ///
    /// Memory is only written after the responder succeeded, so a failed
    /// turn never shows up in the user's history.
    async fn answer_one(
        responder: &R,
        store: &S,
        params: &DispatchParams,
        item: BatchItem,
    ) -> Outcome {
        let context = store
            .build_context(&item.user, &item.role, params.history_limit)
            .await;
        let (system_instruction, conversation) = context.with_question(item.question.content());

        debug!(
            request_id = %item.id,
            user = %item.user,
            history = conversation.len() - 1,
            "Calling responder {}",
            responder.name()
        );

        let call = responder.respond(&system_instruction, &conversation);
        let result = match params.responder_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(ResponderError::Timeout)),
            None => call.await,
        };

        let answer = match result {
            Ok(answer) => answer,
            Err(e) => {
                warn!(
                    request_id = %item.id,
                    user = %item.user,
                    "Responder failed, history left untouched: {}",
                    e
                );
                return Err(e.into());
            }
        };

        let question = Message::at(Role::User, item.question.into_content(), item.arrived_at);
        if let Err(e) = store
            .append_turn(&item.user, question, Message::assistant(answer.as_str()))
            .await
        {
            // The turn is kept in memory; only its durable copy is missing.
            error!(
                request_id = %item.id,
                user = %item.user,
                "Failed to persist conversation turn: {}",
                e
            );
        }

        Ok(answer)
    }
}

#[async_trait]
impl<R, S> BatchDispatcher for DispatchBatchUseCase<R, S>
where
    R: Responder + ?Sized + 'static,
    S: ConversationStore + ?Sized + 'static,
{
    async fn dispatch(&self, batch: Vec<BatchItem>) -> Result<Vec<Outcome>, BatchDispatchError> {
        Ok(self.run(batch).await)
    }
}
