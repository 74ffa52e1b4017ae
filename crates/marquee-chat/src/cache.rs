//! Per-conversation entity memory.
//!
//! Each conversation remembers, per source kind, every entity it has
//! resolved: the formatted block, its citation and images, and the order
//! in which entities were first discovered. Resolvers never touch this
//! state directly. They read a [`KindSnapshot`] taken at the start of a
//! turn and return [`EntityCommit`]s, which a single serialized
//! [`EntityCache::commit`] call merges after all resolvers have joined.
//! The merge is first-write-wins per normalized key, so overlapping
//! turns on one conversation may duplicate an external lookup but can
//! never produce divergent records.

use std::collections::HashMap;
use std::sync::Mutex;

use marquee_core::SourceKind;
use marquee_sources::FormattedEntity;
use tracing::debug;

use crate::error::ChatError;

/// Case-fold an identifier into its cache key.
///
/// "Inception", "inception", and " INCEPTION " all address the same
/// record within a conversation and kind.
pub fn normalize_key(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Entities one conversation has discovered for one source kind.
///
/// Resolvers receive a clone of this as their read snapshot; the cache
/// holds the live copy.
#[derive(Clone, Debug, Default)]
pub struct KindSnapshot {
    /// Normalized key to the resolved entity (canonical name, block,
    /// citation, images).
    pub records: HashMap<String, FormattedEntity>,
    /// Canonical display names in first-resolution order. The position
    /// of a name is its discovery index; replay on implicit reference
    /// walks this list.
    pub discovered: Vec<String>,
}

impl KindSnapshot {
    /// Whether a canonical name is already registered, case-insensitively.
    fn knows_name(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.discovered.iter().any(|n| n.to_lowercase() == lowered)
    }
}

/// A newly resolved entity to merge into the cache.
#[derive(Clone, Debug)]
pub struct EntityCommit {
    /// Normalized form of the identifier the user actually wrote, not
    /// the canonical name the source returned.
    pub key: String,
    pub entity: FormattedEntity,
}

/// Conversation-scoped entity cache shared by all resolvers.
pub struct EntityCache {
    inner: Mutex<HashMap<String, HashMap<SourceKind, KindSnapshot>>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Take a point-in-time copy of one conversation's entities for one
    /// kind. Unknown conversations yield an empty snapshot.
    pub fn snapshot(
        &self,
        conversation_id: &str,
        kind: SourceKind,
    ) -> Result<KindSnapshot, ChatError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| ChatError::StorageError(format!("entity cache lock poisoned: {}", e)))?;
        Ok(inner
            .get(conversation_id)
            .and_then(|kinds| kinds.get(&kind))
            .cloned()
            .unwrap_or_default())
    }

    /// Merge resolved entities into the cache. First write wins per
    /// normalized key; canonical names are registered in discovery order
    /// once, case-insensitively. Returns how many commits were applied.
    pub fn commit(
        &self,
        conversation_id: &str,
        kind: SourceKind,
        commits: Vec<EntityCommit>,
    ) -> Result<usize, ChatError> {
        if commits.is_empty() {
            return Ok(0);
        }
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| ChatError::StorageError(format!("entity cache lock poisoned: {}", e)))?;
        let state = inner
            .entry(conversation_id.to_string())
            .or_default()
            .entry(kind)
            .or_default();

        let mut applied = 0;
        for commit in commits {
            if state.records.contains_key(&commit.key) {
                debug!(
                    kind = kind.label(),
                    key = %commit.key,
                    "commit skipped, key already cached"
                );
                continue;
            }
            if !state.knows_name(&commit.entity.name) {
                state.discovered.push(commit.entity.name.clone());
            }
            state.records.insert(commit.key, commit.entity);
            applied += 1;
        }
        Ok(applied)
    }

    /// Drop every record for a conversation. Called when the store
    /// evicts the conversation itself.
    pub fn evict(&self, conversation_id: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.remove(conversation_id);
        }
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
