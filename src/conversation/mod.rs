//! Per-conversation history
//!
//! Each conversation lives behind its own async mutex. Holding the guard for
//! the whole read / generate / append sequence keeps exchanges in one
//! conversation strictly ordered while other conversations run in parallel.


use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Bot,
}

impl fmt::Display for Speaker {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("User"),
            Self::Bot => f.write_str("Bot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl fmt::Display for HistoryEntry {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

/// Append-only list of alternating user and bot entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    entries: Vec<HistoryEntry>,
}

impl Conversation {
    #[inline]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last `exchanges` question/answer pairs, one `Speaker: text` line each
    #[inline]
    pub fn recent_text(&self, exchanges: usize) -> String {
        let keep = exchanges.saturating_mul(2);
        let skip = self.entries.len().saturating_sub(keep);
        self.entries[skip..].iter().join("\n")
    }

    /// Every entry, oldest first
    #[inline]
    pub fn transcript(&self) -> String {
        self.entries.iter().join("\n")
    }

    #[inline]
    pub fn record_exchange(&mut self, query: &str, answer: &str) {
        let at = Utc::now();
        self.entries.push(HistoryEntry {
            speaker: Speaker::User,
            text: query.to_string(),
            at,
        });
        self.entries.push(HistoryEntry {
            speaker: Speaker::Bot,
            text: answer.to_string(),
            at,
        });
    }
}

type Slot = Arc<AsyncMutex<Conversation>>;

#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Mutex<HashMap<ConversationId, Slot>>,
}

impl ConversationStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &ConversationId) -> Slot {
        self.conversations
            .lock()
            .entry(id.clone())
            .or_default()
            .clone()
    }

    /// Wait for exclusive access to a conversation, creating it if needed
    #[inline]
    pub async fn lock(&self, id: &ConversationId) -> OwnedMutexGuard<Conversation> {
        self.slot(id).lock_owned().await
    }

    /// Snapshot of a conversation's entries; empty for unknown ids
    #[inline]
    pub async fn entries(&self, id: &ConversationId) -> Vec<HistoryEntry> {
        let slot = self.conversations.lock().get(id).cloned();
        match slot {
            Some(slot) => slot.lock().await.entries().to_vec(),
            None => Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.conversations.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conversations.lock().is_empty()
    }
}
