//! Prompt domain
//!
//! Templates for the system instruction handed to the responder.

mod template;

pub use template::PromptTemplate;
