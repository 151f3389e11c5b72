//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod batch_coordinator;
pub mod clear_conversation;
pub mod counsel_service;
pub mod dispatch_batch;
pub mod shared;

#[cfg(test)]
pub(crate) mod test_support;
