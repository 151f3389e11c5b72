//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Invalid user identifier: {0}")]
    InvalidUser(String),

    #[error("Invalid role label for user {0}")]
    InvalidRoleLabel(String),

    #[error("User directory is empty")]
    EmptyDirectory,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid batch policy: {0}")]
    InvalidBatchPolicy(String),
}

impl DomainError {
    /// Check if this error is an admission rejection for an unregistered user
    pub fn is_unknown_user(&self) -> bool {
        matches!(self, DomainError::UnknownUser(_))
    }
}
