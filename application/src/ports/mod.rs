//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod batch_dispatcher;
pub mod conversation_store;
pub mod responder;
