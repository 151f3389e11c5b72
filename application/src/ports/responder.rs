//! Responder port
//!
//! Defines the interface to the text-generation backend. Hosted APIs and
//! local inference servers are both adapters behind this one trait.

use async_trait::async_trait;
use counsel_domain::ChatTurn;
use thiserror::Error;

/// Errors that can occur while generating an answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Backend returned no text")]
    EmptyResponse,

    #[error("Responder not configured: {0}")]
    NotConfigured(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Text-generation backend
///
/// Receives the system instruction and the ordered conversation (prior
/// history followed by the in-flight question) and returns one answer.
/// Implementations must be safe to call concurrently: the dispatcher
/// issues one call per batch member at the same time.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &str;

    /// Whether the backend is loaded and able to accept calls
    fn is_ready(&self) -> bool {
        true
    }

    /// Generate an answer for the given conversation
    async fn respond(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
    ) -> Result<String, ResponderError>;
}
