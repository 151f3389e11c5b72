//! Domain layer for counsel-gateway
//!
//! This crate contains the core value objects and entities.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Directory
//!
//! A static table of registered callers and their role labels. Admission
//! of every request starts with a directory lookup.
//!
//! ## Conversation
//!
//! Each user owns an append-only [`ConversationRecord`]. The record is folded
//! into every responder call as context, after being stripped of timestamps
//! into [`ChatTurn`]s.
//!
//! ## Batching
//!
//! [`BatchPolicy`] decides when concurrently arriving requests are released
//! together: on reaching `max_size`, or after `max_wait`, whichever comes first.

pub mod batching;
pub mod conversation;
pub mod core;
pub mod directory;
pub mod prompt;

// Re-export commonly used types
pub use batching::policy::{BatchPolicy, CloseReason};
pub use conversation::entities::{ChatTurn, ConversationRecord, Message, Role};
pub use core::{error::DomainError, question::Question};
pub use directory::{
    entities::{RoleLabel, UserId},
    user_directory::UserDirectory,
};
pub use prompt::PromptTemplate;
