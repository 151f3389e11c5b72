//! Mock ports shared by use case tests.

use crate::ports::conversation_store::{ConversationStore, StoreError};
use crate::ports::responder::{Responder, ResponderError};
use async_trait::async_trait;
use counsel_domain::{ChatTurn, Message, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A recorded responder call
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub system_instruction: String,
    pub history: Vec<ChatTurn>,
}

/// Responder that echoes the last question.
///
/// Questions containing `fail` produce an error, questions containing
/// `panic` panic, and questions containing `slow` sleep for `slow_delay`
/// before answering.
pub(crate) struct MockResponder {
    pub calls: Mutex<Vec<RecordedCall>>,
    pub slow_delay: Duration,
    pub ready: bool,
}

impl MockResponder {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            slow_delay: Duration::from_millis(200),
            ready: true,
        }
    }

    pub fn with_slow_delay(mut self, delay: Duration) -> Self {
        self.slow_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for MockResponder {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn respond(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
    ) -> Result<String, ResponderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_instruction: system_instruction.to_string(),
            history: history.to_vec(),
        });

        let question = history
            .last()
            .map(|turn| turn.content.clone())
            .unwrap_or_default();

        if question.contains("slow") {
            tokio::time::sleep(self.slow_delay).await;
        }
        if question.contains("panic") {
            panic!("responder exploded");
        }
        if question.contains("fail") {
            return Err(ResponderError::RequestFailed("backend unavailable".into()));
        }
        Ok(format!("answer to: {}", question))
    }
}

/// In-memory store with a switch to make persistence fail.
pub(crate) struct MockStore {
    records: Mutex<HashMap<UserId, Vec<Message>>>,
    pub fail_writes: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let store = Self::new();
        store.fail_writes.store(true, Ordering::SeqCst);
        store
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Persistence("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConversationStore for MockStore {
    async fn append(&self, user: &UserId, message: Message) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap()
            .entry(user.clone())
            .or_default()
            .push(message);
        self.check()
    }

    async fn append_turn(
        &self,
        user: &UserId,
        question: Message,
        answer: Message,
    ) -> Result<(), StoreError> {
        {
            let mut records = self.records.lock().unwrap();
            let record = records.entry(user.clone()).or_default();
            record.push(question);
            record.push(answer);
        }
        self.check()
    }

    async fn history(&self, user: &UserId) -> Vec<Message> {
        self.records
            .lock()
            .unwrap()
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        self.records.lock().unwrap().remove(user);
        self.check()
    }

    async fn export_snapshot(&self) -> BTreeMap<String, Vec<Message>> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(user, messages)| (user.to_string(), messages.clone()))
            .collect()
    }
}

pub(crate) fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}
