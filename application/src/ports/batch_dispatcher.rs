//! Batch dispatcher port
//!
//! The seam between the batch coordinator and whatever runs a closed batch.
//! The coordinator keeps every completion handle; a dispatcher only sees
//! the batch items and returns one outcome per item, in batch order.

use crate::use_cases::shared::{AskError, Outcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use counsel_domain::{Question, RoleLabel, UserId};
use thiserror::Error;
use uuid::Uuid;

/// Unexpected failure of a whole batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Batch dispatch failed: {0}")]
pub struct BatchDispatchError(pub String);

impl From<BatchDispatchError> for AskError {
    fn from(e: BatchDispatchError) -> Self {
        AskError::BatchDispatchFailure(e.0)
    }
}

/// One admitted request, as handed to a dispatcher
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: Uuid,
    pub user: UserId,
    pub role: RoleLabel,
    pub question: Question,
    pub arrived_at: DateTime<Utc>,
}

/// Runs a closed batch
#[async_trait]
pub trait BatchDispatcher: Send + Sync {
    /// Run every item and return exactly one [`Outcome`] per item, in the
    /// order of `batch`.
    async fn dispatch(&self, batch: Vec<BatchItem>) -> Result<Vec<Outcome>, BatchDispatchError>;
}
