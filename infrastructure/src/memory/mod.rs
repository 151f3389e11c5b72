//! Conversation memory adapters
//!
//! All stores share [`ConversationShards`] for their in-memory state and
//! differ only in how mutations reach disk.

mod in_memory;
mod jsonl_store;
mod shards;
mod snapshot_store;

pub use in_memory::InMemoryConversationStore;
pub use jsonl_store::JsonlConversationStore;
pub use shards::ConversationShards;
pub use snapshot_store::JsonSnapshotStore;

use crate::config::{FileMemoryConfig, MemoryBackend};
use counsel_application::{ConversationStore, StoreError};
use std::sync::Arc;
use tracing::info;

/// Open the store selected by `[memory]`.
pub async fn open_store(
    config: &FileMemoryConfig,
) -> Result<Arc<dyn ConversationStore>, StoreError> {
    let path = config.resolved_path();
    let store: Arc<dyn ConversationStore> = match config.backend {
        MemoryBackend::Jsonl => Arc::new(JsonlConversationStore::open(&path).await?),
        MemoryBackend::Snapshot => Arc::new(JsonSnapshotStore::open(&path).await?),
        MemoryBackend::Memory => Arc::new(InMemoryConversationStore::new()),
    };

    match config.backend {
        MemoryBackend::Memory => info!("Conversation memory: in-process only"),
        backend => info!("Conversation memory: {} at {}", backend, path.display()),
    }
    Ok(store)
}
