//! Conversation history: messages, turns and per-user records.

pub mod entities;
