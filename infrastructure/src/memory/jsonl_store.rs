//! Append-only JSONL conversation store.
//!
//! Every mutation is exactly one line appended to the log and synced before
//! the call returns. A completed turn carries both of its messages on a
//! single line:
//!
//! ```text
//! {"op":"append","user":"Linda","role":"user","content":"...","timestamp":"..."}
//! {"op":"turn","user":"Linda","question":{...},"answer":{...}}
//! {"op":"clear","user":"Linda","timestamp":"..."}
//! ```
//!
//! The log is replayed and compacted when the store is opened. A crash can
//! at worst leave a torn final line, possibly cut inside a multi-byte
//! character, which replay skips as a whole; existing history is never
//! rewritten in place.

use super::shards::ConversationShards;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use counsel_application::{ConversationStore, StoreError};
use counsel_domain::{ConversationRecord, Message, Role, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// One line of the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum LogOp {
    Append {
        user: UserId,
        role: Role,
        content: String,
        timestamp: DateTime<Utc>,
    },
    Turn {
        user: UserId,
        question: Message,
        answer: Message,
    },
    Clear {
        user: UserId,
        timestamp: DateTime<Utc>,
    },
}

impl LogOp {
    fn append(user: &UserId, message: &Message) -> Self {
        LogOp::Append {
            user: user.clone(),
            role: message.role,
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// The open log file
struct LogFile {
    file: File,
    /// A previous write may have left a partial line behind.
    torn: bool,
}

pub struct JsonlConversationStore {
    shards: ConversationShards,
    log: Mutex<LogFile>,
    path: PathBuf,
}

impl JsonlConversationStore {
    /// Open (or create) the log at `path`, replaying and compacting it.
    ///
    /// An unreadable log is moved aside with a `.corrupt` suffix and the
    /// store starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let records = match fs::read(&path).await {
            Ok(content) => replay(&path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                let aside = quarantine(&path).await?;
                warn!(
                    "Conversation log {} is unreadable ({}); moved to {} and starting empty",
                    path.display(),
                    e,
                    aside.display()
                );
                BTreeMap::new()
            }
        };

        compact(&path, &records).await?;

        let message_count: usize = records.values().map(ConversationRecord::len).sum();
        info!(
            users = records.len(),
            messages = message_count,
            "Recovered conversation memory from {}",
            path.display()
        );

        let file = OpenOptions::new().append(true).open(&path).await?;

        Ok(Self {
            shards: ConversationShards::from_records(records),
            log: Mutex::new(LogFile { file, torn: false }),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append ops as one write and sync it to disk.
    async fn persist(&self, ops: &[LogOp]) -> Result<(), StoreError> {
        let mut buffer = Vec::new();
        for op in ops {
            serde_json::to_writer(&mut buffer, op)?;
            buffer.push(b'\n');
        }

        let mut log = self.log.lock().await;
        if log.torn {
            // Terminate the partial line so this write starts on a fresh one.
            buffer.insert(0, b'\n');
        }

        let result = async {
            log.file.write_all(&buffer).await?;
            log.file.sync_data().await
        }
        .await;

        log.torn = result.is_err();
        result.map_err(StoreError::from)
    }
}

#[async_trait]
impl ConversationStore for JsonlConversationStore {
    async fn append(&self, user: &UserId, message: Message) -> Result<(), StoreError> {
        let slot = self.shards.slot(user);
        let mut record = slot.lock().await;
        let result = self.persist(&[LogOp::append(user, &message)]).await;
        record.push(message);
        result
    }

    async fn append_turn(
        &self,
        user: &UserId,
        question: Message,
        answer: Message,
    ) -> Result<(), StoreError> {
        let slot = self.shards.slot(user);
        let mut record = slot.lock().await;
        let result = self
            .persist(&[LogOp::Turn {
                user: user.clone(),
                question: question.clone(),
                answer: answer.clone(),
            }])
            .await;
        record.push(question);
        record.push(answer);
        result
    }

    async fn history(&self, user: &UserId) -> Vec<Message> {
        self.shards.history(user).await
    }

    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        let slot = self.shards.slot(user);
        let mut record = slot.lock().await;
        let result = self
            .persist(&[LogOp::Clear {
                user: user.clone(),
                timestamp: Utc::now(),
            }])
            .await;
        *record = ConversationRecord::new();
        result
    }

    async fn export_snapshot(&self) -> BTreeMap<String, Vec<Message>> {
        self.shards.snapshot().await
    }
}

/// Rebuild records from log content.
///
/// Works on raw bytes so a line cut inside a multi-byte character is just
/// another unparseable line. Lines that do not parse are skipped: the final
/// one is the expected result of a crash mid-write, any other is reported
/// louder.
fn replay(path: &Path, content: &[u8]) -> BTreeMap<UserId, ConversationRecord> {
    let mut records: HashMap<UserId, ConversationRecord> = HashMap::new();
    let lines: Vec<&[u8]> = content
        .split(|byte| *byte == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .collect();
    let last = lines.len().saturating_sub(1);

    for (index, line) in lines.iter().enumerate() {
        match serde_json::from_slice::<LogOp>(line) {
            Ok(LogOp::Append {
                user,
                role,
                content,
                timestamp,
            }) => records
                .entry(user)
                .or_default()
                .push(Message::at(role, content, timestamp)),
            Ok(LogOp::Turn {
                user,
                question,
                answer,
            }) => {
                let record = records.entry(user).or_default();
                record.push(question);
                record.push(answer);
            }
            Ok(LogOp::Clear { user, .. }) => {
                records.remove(&user);
            }
            Err(e) if index == last => {
                warn!(
                    "Skipping torn final line of conversation log {}: {}",
                    path.display(),
                    e
                );
            }
            Err(e) => {
                warn!(
                    "Skipping unreadable line {} of conversation log {}: {}",
                    index + 1,
                    path.display(),
                    e
                );
            }
        }
    }

    records
        .into_iter()
        .filter(|(_, record)| !record.is_empty())
        .collect()
}

/// Rewrite the log to hold exactly `records`, via temp file and rename.
async fn compact(
    path: &Path,
    records: &BTreeMap<UserId, ConversationRecord>,
) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    for (user, record) in records {
        for message in record.messages() {
            serde_json::to_writer(&mut buffer, &LogOp::append(user, message))?;
            buffer.push(b'\n');
        }
    }

    let tmp = sibling(path, "tmp");
    let mut file = File::create(&tmp).await?;
    file.write_all(&buffer).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Move an unreadable file out of the way; returns its new path.
pub(super) async fn quarantine(path: &Path) -> Result<PathBuf, StoreError> {
    let aside = sibling(path, "corrupt");
    fs::rename(path, &aside).await?;
    Ok(aside)
}

/// `path` with `.suffix` appended to its file name
pub(super) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
