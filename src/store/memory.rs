use crate::config::StoreConfig;
use crate::store::{ConversationId, ConversationStore};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Ten years; longer TTLs are clamped
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug)]
struct Entry {
    payload: Value,
    saved_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<ConversationId, Entry>,
    /// Ids in insertion order, oldest first
    order: VecDeque<ConversationId>,
}

/// In-memory conversation store with expiry and a size cap
///
/// Expired entries are purged on every write and never returned on read.
/// When the store is full the oldest conversation is evicted.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    ttl: Duration,
    capacity: usize,
}

impl MemoryStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let ttl_secs = config.ttl_secs.min(MAX_TTL_SECS) as i64;
        Self::new(Duration::seconds(ttl_secs), config.capacity)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.saved_at) >= self.ttl
    }

    pub(crate) fn put_at(&self, payload: Value, now: DateTime<Utc>) -> ConversationId {
        let mut inner = self.lock();

        let expired: Vec<ConversationId> = inner
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(id, _)| id.clone())
            .collect();
        if !expired.is_empty() {
            tracing::debug!("Purging {} expired conversations", expired.len());
            for id in &expired {
                inner.entries.remove(id);
            }
            inner.order.retain(|id| !expired.contains(id));
        }

        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            tracing::debug!("Evicting conversation {}", oldest);
            inner.entries.remove(&oldest);
        }

        let id = loop {
            let candidate = ConversationId::generate();
            if !inner.entries.contains_key(&candidate) {
                break candidate;
            }
        };

        inner.entries.insert(
            id.clone(),
            Entry {
                payload,
                saved_at: now,
            },
        );
        inner.order.push_back(id.clone());
        id
    }

    pub(crate) fn get_at(&self, id: &ConversationId, now: DateTime<Utc>) -> Option<Value> {
        let inner = self.lock();
        inner
            .entries
            .get(id)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.payload.clone())
    }
}

impl ConversationStore for MemoryStore {
    fn put(&self, payload: Value) -> ConversationId {
        self.put_at(payload, Utc::now())
    }

    fn get(&self, id: &ConversationId) -> Option<Value> {
        self.get_at(id, Utc::now())
    }
}
