//! Whole-file JSON snapshot store.
//!
//! Keeps every conversation in a single JSON object,
//! `{"Linda": [{"role", "content", "timestamp"}, ...], ...}`, rewritten after
//! each mutation. The rewrite goes to a temp file that is synced and then
//! renamed over the old snapshot, so a crash leaves either the old or the
//! new file, never a truncated one.

use super::jsonl_store::{quarantine, sibling};
use super::shards::ConversationShards;
use async_trait::async_trait;
use counsel_application::{ConversationStore, StoreError};
use counsel_domain::{ConversationRecord, Message, UserId};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct JsonSnapshotStore {
    shards: ConversationShards,
    path: PathBuf,
    /// Serializes snapshot rewrites.
    write_lock: Mutex<()>,
}

impl JsonSnapshotStore {
    /// Open (or create) the snapshot at `path`.
    ///
    /// A snapshot that cannot be read or parsed is moved aside with a
    /// `.corrupt` suffix and the store starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let records = match fs::read_to_string(&path).await {
            Ok(content) => match parse_snapshot(&content) {
                Ok(records) => records,
                Err(e) => {
                    let aside = quarantine(&path).await?;
                    warn!(
                        "Conversation snapshot {} is unparseable ({}); moved to {} and starting empty",
                        path.display(),
                        e,
                        aside.display()
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                let aside = quarantine(&path).await?;
                warn!(
                    "Conversation snapshot {} is unreadable ({}); moved to {} and starting empty",
                    path.display(),
                    e,
                    aside.display()
                );
                BTreeMap::new()
            }
        };

        let message_count: usize = records.values().map(ConversationRecord::len).sum();
        info!(
            users = records.len(),
            messages = message_count,
            "Recovered conversation memory from {}",
            path.display()
        );

        Ok(Self {
            shards: ConversationShards::from_records(records),
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current state of every record to disk.
    ///
    /// The snapshot is taken under the write lock, so the last rewrite to
    /// finish always carries the newest state.
    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.shards.snapshot().await;
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = sibling(&self.path, "tmp");
        let mut file = File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn parse_snapshot(
    content: &str,
) -> Result<BTreeMap<UserId, ConversationRecord>, serde_json::Error> {
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let raw: BTreeMap<UserId, Vec<Message>> = serde_json::from_str(content)?;
    Ok(raw
        .into_iter()
        .filter(|(_, messages)| !messages.is_empty())
        .map(|(user, messages)| (user, ConversationRecord::from(messages)))
        .collect())
}

#[async_trait]
impl ConversationStore for JsonSnapshotStore {
    async fn append(&self, user: &UserId, message: Message) -> Result<(), StoreError> {
        self.shards.slot(user).lock().await.push(message);
        self.persist().await
    }

    async fn append_turn(
        &self,
        user: &UserId,
        question: Message,
        answer: Message,
    ) -> Result<(), StoreError> {
        {
            let slot = self.shards.slot(user);
            let mut record = slot.lock().await;
            record.push(question);
            record.push(answer);
        }
        self.persist().await
    }

    async fn history(&self, user: &UserId) -> Vec<Message> {
        self.shards.history(user).await
    }

    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        match self.shards.existing(user) {
            Some(slot) => {
                *slot.lock().await = ConversationRecord::new();
            }
            None => return Ok(()),
        }
        self.persist().await
    }

    async fn export_snapshot(&self) -> BTreeMap<String, Vec<Message>> {
        self.shards.snapshot().await
    }
}
