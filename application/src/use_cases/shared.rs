//! Shared types for use cases.
//!
//! [`AskError`] is the caller-visible failure taxonomy for Ask and Clear.
//! Every internal failure is converted into one of these variants before
//! it reaches a completion handle.

use crate::ports::conversation_store::StoreError;
use crate::ports::responder::ResponderError;
use counsel_domain::DomainError;
use thiserror::Error;

/// Result of one batch item: the answer, or why there is none.
pub type Outcome = Result<String, AskError>;

/// Errors surfaced to a caller of Ask or Clear
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AskError {
    #[error("Unknown user")]
    UnknownUser(String),

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Responder failed: {0}")]
    ResponderFailure(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailure(String),

    #[error("Batch dispatch failed: {0}")]
    BatchDispatchFailure(String),

    #[error("Request queue is full ({0} pending)")]
    QueueFull(usize),

    #[error("Gateway is shutting down")]
    ShuttingDown,

    #[error("Request was dropped before it was answered")]
    Abandoned,
}

impl AskError {
    /// Whether the request was refused before it occupied a queue slot
    pub fn is_admission_rejection(&self) -> bool {
        matches!(
            self,
            AskError::UnknownUser(_)
                | AskError::InvalidQuestion(_)
                | AskError::QueueFull(_)
                | AskError::ShuttingDown
        )
    }
}

impl From<DomainError> for AskError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownUser(user) | DomainError::InvalidUser(user) => {
                AskError::UnknownUser(user)
            }
            DomainError::InvalidQuestion(reason) => AskError::InvalidQuestion(reason),
            other => AskError::InvalidQuestion(other.to_string()),
        }
    }
}

impl From<ResponderError> for AskError {
    fn from(e: ResponderError) -> Self {
        AskError::ResponderFailure(e.to_string())
    }
}

impl From<StoreError> for AskError {
    fn from(e: StoreError) -> Self {
        AskError::PersistenceFailure(e.to_string())
    }
}
