//! Append-only conversation log with a bounded footprint.
//!
//! Conversations are created lazily on first append and never mutated
//! except by appending messages. The store holds at most
//! `max_conversations` entries; exceeding the bound evicts the
//! least-recently-updated conversation and reports the evicted ids so
//! the caller can drop the matching entity-cache records.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use marquee_core::{Conversation, Message};
use tracing::info;

use crate::error::ChatError;

/// In-memory conversation store shared across turns.
pub struct ConversationStore {
    max_conversations: usize,
    inner: Mutex<HashMap<String, Conversation>>,
}

impl ConversationStore {
    pub fn new(max_conversations: usize) -> Self {
        Self {
            max_conversations,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Append a message, creating the conversation if absent and
    /// bumping its `updated_at`. Returns the ids of any conversations
    /// evicted to stay within the bound.
    pub fn append(
        &self,
        conversation_id: &str,
        message: Message,
    ) -> Result<Vec<String>, ChatError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ChatError::StorageError(format!("conversation lock poisoned: {}", e)))?;

        let conversation = inner
            .entry(conversation_id.to_string())
            .or_insert_with(|| Conversation::new(conversation_id));
        conversation.messages.push(message);
        conversation.updated_at = Utc::now();

        let evicted = self.evict_over_bound(&mut inner, conversation_id);
        for id in &evicted {
            info!(conversation_id = %id, "evicted least-recently-updated conversation");
        }
        Ok(evicted)
    }

    /// Full message history, or `None` for an unknown conversation id.
    pub fn history(&self, conversation_id: &str) -> Result<Option<Vec<Message>>, ChatError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| ChatError::StorageError(format!("conversation lock poisoned: {}", e)))?;
        Ok(inner.get(conversation_id).map(|c| c.messages.clone()))
    }

    /// Number of conversations currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict oldest-updated conversations until the bound holds. The
    /// conversation touched by the current append is never evicted.
    fn evict_over_bound(
        &self,
        inner: &mut HashMap<String, Conversation>,
        current_id: &str,
    ) -> Vec<String> {
        let mut evicted = Vec::new();
        while inner.len() > self.max_conversations {
            let oldest = inner
                .values()
                .filter(|c| c.id != current_id)
                .min_by(|a, b| {
                    a.updated_at
                        .cmp(&b.updated_at)
                        .then_with(|| a.id.cmp(&b.id))
                })
                .map(|c| c.id.clone());
            match oldest {
                Some(id) => {
                    inner.remove(&id);
                    evicted.push(id);
                }
                None => break,
            }
        }
        evicted
    }
}

// =============================================================================
// Tests
// =============================================================================
