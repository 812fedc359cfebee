#![forbid(unsafe_code)]

//! Claim-once memo of derived values.
//!
//! Each key moves `Absent -> Pending -> Ready | Failed` and never back.
//! [`EnrichmentCache::try_claim`] is the only way out of `Absent` and is a
//! single check-and-set under the write lock, so of any number of racing
//! callers exactly one is told to schedule the work.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{PoisonError, RwLock};

use tracing::trace;

use crate::key::EnrichmentKey;

/// State of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry<V> {
    /// Never claimed.
    Absent,
    /// Claimed, lookup not finished.
    Pending,
    /// Lookup succeeded.
    Ready(V),
    /// Lookup failed, with a human readable reason.
    Failed(String),
}

impl<V> CacheEntry<V> {
    /// Whether the key has reached a final state.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }

    /// The value, if ready.
    #[must_use]
    pub const fn ready(&self) -> Option<&V> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Stored states. Absent keys have no slot.
#[derive(Debug)]
enum Slot<V> {
    Pending,
    Ready(V),
    Failed(String),
}

/// Concurrent memo keyed by [`EnrichmentKey`].
#[derive(Debug)]
pub struct EnrichmentCache<V> {
    slots: RwLock<HashMap<EnrichmentKey, Slot<V>>>,
}

impl<V> Default for EnrichmentCache<V> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> EnrichmentCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` pending if it is absent.
    ///
    /// Returns `true` when the caller won the claim and must schedule the
    /// lookup; `false` when the key is already pending or resolved.
    pub fn try_claim(&self, key: &EnrichmentKey) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        match slots.entry(key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Pending);
                trace!(event = "cache.claim", key = %key);
                true
            }
        }
    }

    /// Current state of `key`.
    #[must_use]
    pub fn get(&self, key: &EnrichmentKey) -> CacheEntry<V> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        match slots.get(key) {
            None => CacheEntry::Absent,
            Some(Slot::Pending) => CacheEntry::Pending,
            Some(Slot::Ready(v)) => CacheEntry::Ready(v.clone()),
            Some(Slot::Failed(reason)) => CacheEntry::Failed(reason.clone()),
        }
    }

    /// Resolve a pending key.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not pending. Only the claimant may store, once.
    pub fn store(&self, key: &EnrichmentKey, result: Result<V, String>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.get_mut(key);
        assert!(
            matches!(slot, Some(Slot::Pending)),
            "store on non-pending enrichment key {key}"
        );
        if let Some(slot) = slot {
            trace!(event = "cache.store", key = %key, ok = result.is_ok());
            *slot = match result {
                Ok(v) => Slot::Ready(v),
                Err(reason) => Slot::Failed(reason),
            };
        }
    }

    /// Number of keys that have been claimed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All claimed keys and their states, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(EnrichmentKey, CacheEntry<V>)> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<_> = slots
            .iter()
            .map(|(k, slot)| {
                let entry = match slot {
                    Slot::Pending => CacheEntry::Pending,
                    Slot::Ready(v) => CacheEntry::Ready(v.clone()),
                    Slot::Failed(reason) => CacheEntry::Failed(reason.clone()),
                };
                (k.clone(), entry)
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}
