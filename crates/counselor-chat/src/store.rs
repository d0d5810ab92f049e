//! Append-only conversation log.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use counselor_core::{Language, Message, MessageId, Sender};

use crate::error::ChatError;

/// A message that has not been appended yet. The store assigns its id and
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub text: String,
    pub sender: Sender,
    pub language: Language,
}

impl MessageDraft {
    pub fn user(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            language,
        }
    }

    pub fn assistant(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            language,
        }
    }
}

#[derive(Debug, Default)]
struct Log {
    messages: Vec<Message>,
    last_id: u64,
}

/// Ordered, write-once message log for one open conversation.
///
/// Cloning yields another handle to the same log, so the host can keep
/// rendering from it while the controller appends. No update or delete is
/// exposed.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    log: Arc<RwLock<Log>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the stored copy.
    ///
    /// Ids start at 1 and increase by one per append.
    pub fn append(&self, draft: MessageDraft) -> Result<Message, ChatError> {
        if draft.text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut log = self
            .log
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        log.last_id += 1;
        let message = Message {
            id: MessageId(log.last_id),
            text: draft.text,
            sender: draft.sender,
            timestamp: Utc::now(),
            language: draft.language,
        };
        log.messages.push(message.clone());
        tracing::trace!(id = %message.id, sender = %message.sender, "Message appended");
        Ok(message)
    }

    /// Snapshot of every message in insertion order.
    pub fn all(&self) -> Vec<Message> {
        self.read(|log| log.messages.clone())
    }

    pub fn get(&self, id: MessageId) -> Option<Message> {
        self.read(|log| log.messages.iter().find(|m| m.id == id).cloned())
    }

    /// Most recent message from `sender`, if any.
    pub fn last_from(&self, sender: Sender) -> Option<Message> {
        self.read(|log| log.messages.iter().rev().find(|m| m.sender == sender).cloned())
    }

    pub fn len(&self) -> usize {
        self.read(|log| log.messages.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<T>(&self, f: impl FnOnce(&Log) -> T) -> T {
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&log)
    }
}
