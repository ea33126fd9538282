//! Bounded per-session conversation memory.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::providers::{MessageRole, ProviderMessage};

/// Six user/assistant exchanges.
pub const DEFAULT_MEMORY_CAPACITY: usize = 12;
/// Sessions kept before the least recently used one is dropped.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Ordered FIFO buffer of recent messages.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    entries: VecDeque<ProviderMessage>,
    capacity: usize,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: ProviderMessage) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// Append a user turn and the reply to it. History never starts with an
    /// orphaned assistant turn, even when the capacity is odd.
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.push(ProviderMessage::user(user));
        self.push(ProviderMessage::assistant(assistant));
        while self
            .entries
            .front()
            .is_some_and(|m| m.role == MessageRole::Assistant)
            && self.entries.len() > 1
        {
            self.entries.pop_front();
        }
    }

    pub fn snapshot(&self) -> Vec<ProviderMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Default)]
struct Sessions {
    memories: HashMap<String, SessionSlot>,
    clock: u64,
}

#[derive(Debug)]
struct SessionSlot {
    memory: ConversationMemory,
    last_used: u64,
}

/// Session-keyed memories shared across concurrent requests.
///
/// Session names come from callers, so the number of sessions is capped;
/// a new session past the cap evicts the least recently used one.
#[derive(Debug)]
pub struct MemoryRegistry {
    sessions: Mutex<Sessions>,
    capacity: usize,
    max_sessions: usize,
}

impl MemoryRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            capacity,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sessions> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Copy of a session's recent messages; empty for unknown sessions.
    pub fn snapshot(&self, session: &str) -> Vec<ProviderMessage> {
        let mut sessions = self.lock();
        sessions.clock += 1;
        let now = sessions.clock;
        sessions
            .memories
            .get_mut(session)
            .map(|slot| {
                slot.last_used = now;
                slot.memory.snapshot()
            })
            .unwrap_or_default()
    }

    /// Both turns land under one lock so concurrent exchanges never interleave.
    pub fn record_exchange(&self, session: &str, user: &str, assistant: &str) {
        let mut sessions = self.lock();
        sessions.clock += 1;
        let now = sessions.clock;

        if !sessions.memories.contains_key(session)
            && sessions.memories.len() >= self.max_sessions
            && let Some(oldest) = sessions
                .memories
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(name, _)| name.clone())
        {
            sessions.memories.remove(&oldest);
            tracing::debug!(session = %oldest, "evicted idle session memory");
        }

        let capacity = self.capacity;
        let slot = sessions
            .memories
            .entry(session.to_string())
            .or_insert_with(|| SessionSlot {
                memory: ConversationMemory::new(capacity),
                last_used: now,
            });
        slot.last_used = now;
        slot.memory.record_exchange(user, assistant);
    }

    pub fn clear(&self, session: &str) {
        self.lock().memories.remove(session);
    }

    pub fn session_count(&self) -> usize {
        self.lock().memories.len()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}
