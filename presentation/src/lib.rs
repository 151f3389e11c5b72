//! Presentation layer for counsel-gateway
//!
//! This crate contains the CLI definition and the HTTP transport.

pub mod cli;
pub mod http;

// Re-export commonly used types
pub use cli::commands::{Cli, MemoryArg, ResponderArg};
pub use http::{ApiError, AppState, create_router};
