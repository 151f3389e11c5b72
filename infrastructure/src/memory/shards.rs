//! Per-user record slots.
//!
//! The outer map lock is held only long enough to find or insert a slot.
//! Every mutation of a record happens under that user's own async mutex,
//! so two users never contend and one user's writes never interleave.

use counsel_domain::{ConversationRecord, Message, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

pub type RecordSlot = Arc<Mutex<ConversationRecord>>;

#[derive(Default)]
pub struct ConversationShards {
    slots: RwLock<HashMap<UserId, RecordSlot>>,
}

impl ConversationShards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the shards with records recovered from storage.
    pub fn from_records(records: impl IntoIterator<Item = (UserId, ConversationRecord)>) -> Self {
        let slots = records
            .into_iter()
            .map(|(user, record)| (user, Arc::new(Mutex::new(record))))
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// The user's slot, created empty on first use.
    pub fn slot(&self, user: &UserId) -> RecordSlot {
        if let Some(slot) = self.existing(user) {
            return slot;
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(user.clone()).or_default())
    }

    /// The user's slot if one exists; never inserts.
    pub fn existing(&self, user: &UserId) -> Option<RecordSlot> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .cloned()
    }

    pub async fn history(&self, user: &UserId) -> Vec<Message> {
        match self.existing(user) {
            Some(slot) => slot.lock().await.messages().to_vec(),
            None => Vec::new(),
        }
    }

    /// Every non-empty record, keyed by user name.
    pub async fn snapshot(&self) -> BTreeMap<String, Vec<Message>> {
        let slots: Vec<(UserId, RecordSlot)> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(user, slot)| (user.clone(), Arc::clone(slot)))
            .collect();

        let mut snapshot = BTreeMap::new();
        for (user, slot) in slots {
            let record = slot.lock().await;
            if !record.is_empty() {
                snapshot.insert(user.to_string(), record.messages().to_vec());
            }
        }
        snapshot
    }

    /// Number of users with a slot
    pub fn user_count(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
