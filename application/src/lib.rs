//! Application layer for counsel-gateway
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DispatchParams;
pub use ports::{
    batch_dispatcher::{BatchDispatchError, BatchDispatcher, BatchItem},
    conversation_store::{ConversationContext, ConversationStore, StoreError},
    responder::{Responder, ResponderError},
};
pub use use_cases::batch_coordinator::{
    BatchCoordinator, CoordinatorHandle, CoordinatorOptions, PendingAnswer,
};
pub use use_cases::clear_conversation::ClearConversationUseCase;
pub use use_cases::counsel_service::{CounselService, HealthReport};
pub use use_cases::dispatch_batch::DispatchBatchUseCase;
pub use use_cases::shared::{AskError, Outcome};
