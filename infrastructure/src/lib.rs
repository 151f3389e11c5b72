//! Infrastructure layer for counsel-gateway
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod memory;
pub mod responders;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAnthropicConfig, FileBatchConfig, FileConfig,
    FileMemoryConfig, FileOpenAiConfig, FileProvidersConfig, FileResponderConfig,
    FileServerConfig, MemoryBackend, ResponderKind,
};
pub use memory::{
    ConversationShards, InMemoryConversationStore, JsonSnapshotStore, JsonlConversationStore,
    open_store,
};
pub use responders::{AnthropicResponder, OpenAiCompatibleResponder, ResponderFactory};
