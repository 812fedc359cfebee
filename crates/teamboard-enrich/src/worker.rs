#![forbid(unsafe_code)]

//! Per-kind lookup workers.
//!
//! Every [`EnrichmentKind`] has a queue of claimed keys and at most one
//! worker thread. Submitting a key wakes nothing: if the kind's worker is
//! running it will reach the key, otherwise a worker is spawned for it.
//! A worker pops keys in no particular order, runs the blocking lookup,
//! stores the outcome in the cache and reports a [`Completion`]. When its
//! queue is empty it marks the kind idle under the queue lock and exits, so
//! an idle pool holds no threads.
//!
//! # Invariants
//!
//! 1. At most one lookup per kind runs at any time.
//! 2. The `running` flag and the queue share one lock: a key submitted
//!    while a worker is deciding to exit is either popped by that worker or
//!    starts a new one, never stranded.
//! 3. Every popped key is stored exactly once, even if the lookup panics.

use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::{CacheEntry, EnrichmentCache};
use crate::key::{EnrichmentKey, EnrichmentKind};

/// Why a lookup produced no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The upstream source has nothing for this key.
    #[error("no data")]
    NoData,
    /// The lookup itself failed.
    #[error("{0}")]
    Failed(String),
}

/// Blocking computation of one derived value.
pub trait Lookup<V>: Send + Sync {
    fn lookup(&self, key: &EnrichmentKey) -> Result<V, LookupError>;
}

impl<V, F> Lookup<V> for F
where
    F: Fn(&EnrichmentKey) -> Result<V, LookupError> + Send + Sync,
{
    fn lookup(&self, key: &EnrichmentKey) -> Result<V, LookupError> {
        self(key)
    }
}

/// A key that reached a final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion<V> {
    pub key: EnrichmentKey,
    pub entry: CacheEntry<V>,
}

struct KindQueue<V> {
    lookup: Arc<dyn Lookup<V>>,
    queued: HashSet<EnrichmentKey>,
    in_flight: Option<EnrichmentKey>,
    running: bool,
}

impl<V> KindQueue<V> {
    fn pending(&self) -> usize {
        self.queued.len() + usize::from(self.in_flight.is_some())
    }
}

struct Shared<V> {
    queues: Mutex<HashMap<EnrichmentKind, KindQueue<V>>>,
    idle: Condvar,
    cache: Arc<EnrichmentCache<V>>,
    completions: Mutex<Sender<Completion<V>>>,
}

impl<V> Shared<V> {
    fn queues(&self) -> MutexGuard<'_, HashMap<EnrichmentKind, KindQueue<V>>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> Shared<V> {
    fn resolve(&self, key: EnrichmentKey, result: Result<V, String>) {
        self.cache.store(&key, result);
        let entry = self.cache.get(&key);
        let sender = self
            .completions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // The controller may already be gone; its results are discarded.
        let _ = sender.send(Completion { key, entry });
    }
}

/// Lookup workers feeding one [`EnrichmentCache`].
pub struct WorkerPool<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for WorkerPool<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> std::fmt::Debug for WorkerPool<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queues = self.shared.queues();
        let mut kinds: Vec<_> = queues
            .iter()
            .map(|(kind, q)| (kind.name(), q.pending(), q.running))
            .collect();
        kinds.sort_unstable();
        f.debug_struct("WorkerPool").field("kinds", &kinds).finish()
    }
}

impl<V: Clone + Send + Sync + 'static> WorkerPool<V> {
    /// Pool storing into `cache`, plus the receiving end of its completion
    /// channel.
    pub fn new(cache: Arc<EnrichmentCache<V>>) -> (Self, Receiver<Completion<V>>) {
        let (tx, rx) = mpsc::channel();
        let pool = Self {
            shared: Arc::new(Shared {
                queues: Mutex::new(HashMap::new()),
                idle: Condvar::new(),
                cache,
                completions: Mutex::new(tx),
            }),
        };
        (pool, rx)
    }

    /// The cache this pool stores into.
    #[must_use]
    pub fn cache(&self) -> &Arc<EnrichmentCache<V>> {
        &self.shared.cache
    }

    /// Install the lookup for `kind`, replacing any previous one.
    ///
    /// A worker already running keeps the lookup it started with until it
    /// exits.
    pub fn register(&self, kind: EnrichmentKind, lookup: impl Lookup<V> + 'static) {
        let lookup: Arc<dyn Lookup<V>> = Arc::new(lookup);
        let mut queues = self.shared.queues();
        match queues.get_mut(&kind) {
            Some(queue) => queue.lookup = lookup,
            None => {
                queues.insert(
                    kind,
                    KindQueue {
                        lookup,
                        queued: HashSet::new(),
                        in_flight: None,
                        running: false,
                    },
                );
            }
        }
        debug!(event = "worker.register", kind = %kind);
    }

    /// Claim `key` in the cache and queue it if the claim was won.
    ///
    /// Returns whether a lookup was scheduled.
    pub fn request(&self, key: EnrichmentKey) -> bool {
        if !self.shared.cache.try_claim(&key) {
            return false;
        }
        self.submit(key);
        true
    }

    /// Queue an already claimed key for its kind's worker.
    ///
    /// Keys of a kind with no registered lookup are resolved as failed.
    pub fn submit(&self, key: EnrichmentKey) {
        let kind = key.kind;
        let mut queues = self.shared.queues();
        let Some(queue) = queues.get_mut(&kind) else {
            drop(queues);
            warn!(event = "worker.unregistered_kind", key = %key);
            self.shared
                .resolve(key, Err(format!("no lookup registered for kind {kind}")));
            return;
        };

        queue.queued.insert(key);
        if queue.running {
            return;
        }
        queue.running = true;

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("enrich-{kind}"))
            .spawn(move || run_worker(&shared, kind));
        match spawned {
            Ok(_) => debug!(event = "worker.spawn", kind = %kind),
            Err(err) => {
                queue.running = false;
                let stranded: Vec<_> = queue.queued.drain().collect();
                drop(queues);
                self.shared.idle.notify_all();
                warn!(event = "worker.spawn_failed", kind = %kind, error = %err);
                for key in stranded {
                    self.shared
                        .resolve(key, Err(format!("worker unavailable: {err}")));
                }
            }
        }
    }

    /// Keys of `kind` queued or being looked up.
    #[must_use]
    pub fn pending(&self, kind: EnrichmentKind) -> usize {
        self.shared.queues().get(&kind).map_or(0, KindQueue::pending)
    }

    /// Whether no worker is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.shared.queues().values().all(|q| !q.running)
    }

    /// Block until no worker is running or `timeout` elapses.
    ///
    /// Returns whether the pool became idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut queues = self.shared.queues();
        loop {
            if queues.values().all(|q| !q.running) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            queues = self
                .shared
                .idle
                .wait_timeout(queues, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

fn run_worker<V: Clone>(shared: &Shared<V>, kind: EnrichmentKind) {
    loop {
        let (key, lookup) = {
            let mut queues = shared.queues();
            let Some(queue) = queues.get_mut(&kind) else {
                return;
            };
            queue.in_flight = None;
            let next = queue.queued.iter().next().cloned();
            let Some(key) = next else {
                queue.running = false;
                drop(queues);
                shared.idle.notify_all();
                debug!(event = "worker.exit", kind = %kind);
                return;
            };
            queue.queued.remove(&key);
            queue.in_flight = Some(key.clone());
            (key, Arc::clone(&queue.lookup))
        };

        let started = Instant::now();
        let result = match catch_unwind(AssertUnwindSafe(|| lookup.lookup(&key))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err("lookup panicked".to_owned()),
        };
        debug!(
            event = "worker.lookup",
            key = %key,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        shared.resolve(key, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HISTORY: EnrichmentKind = EnrichmentKind::new("history");
    const DETAIL: EnrichmentKind = EnrichmentKind::new("detail");
    const WAIT: Duration = Duration::from_secs(5);

    fn pool() -> (WorkerPool<String>, Receiver<Completion<String>>) {
        WorkerPool::new(Arc::new(EnrichmentCache::new()))
    }

    #[test]
    fn request_resolves_and_reports() {
        let (pool, rx) = pool();
        pool.register(HISTORY, |key: &EnrichmentKey| -> Result<String, LookupError> {
            Ok(format!("wl:{}", key.subject))
        });
        let key = EnrichmentKey::new("p1", HISTORY);
        assert!(pool.request(key.clone()));
        assert!(!pool.request(key.clone()));

        let done = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(done.key, key);
        assert_eq!(done.entry, CacheEntry::Ready("wl:p1".to_owned()));
        assert!(pool.wait_idle(WAIT));
        assert_eq!(pool.pending(HISTORY), 0);
    }

    #[test]
    fn failures_are_stored_with_reason() {
        let (pool, rx) = pool();
        pool.register(HISTORY, |_: &EnrichmentKey| -> Result<String, LookupError> {
            Err(LookupError::Failed("rate limited".into()))
        });
        pool.register(DETAIL, |_: &EnrichmentKey| -> Result<String, LookupError> {
            Err(LookupError::NoData)
        });
        assert!(pool.request(EnrichmentKey::new("p1", HISTORY)));
        assert!(pool.request(EnrichmentKey::new("p1", DETAIL)));

        let mut entries: Vec<_> = (0..2)
            .map(|_| rx.recv_timeout(WAIT).unwrap().entry)
            .collect();
        entries.sort_by_key(|e| format!("{e:?}"));
        assert_eq!(
            entries,
            vec![
                CacheEntry::Failed("no data".into()),
                CacheEntry::Failed("rate limited".into()),
            ]
        );
    }

    #[test]
    fn panicking_lookup_becomes_failure() {
        let (pool, rx) = pool();
        pool.register(HISTORY, |_: &EnrichmentKey| -> Result<String, LookupError> {
            panic!("boom")
        });
        assert!(pool.request(EnrichmentKey::new("p1", HISTORY)));
        let done = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(done.entry, CacheEntry::Failed("lookup panicked".into()));
        assert!(pool.wait_idle(WAIT));
    }

    #[test]
    fn unregistered_kind_fails_immediately() {
        let (pool, rx) = pool();
        assert!(pool.request(EnrichmentKey::new("p1", DETAIL)));
        let done = rx.try_recv().unwrap();
        assert_eq!(
            done.entry,
            CacheEntry::Failed("no lookup registered for kind detail".into())
        );
        assert!(pool.is_idle());
    }

    #[test]
    fn one_lookup_at_a_time_per_kind() {
        let (pool, rx) = pool();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            pool.register(HISTORY, move |key: &EnrichmentKey| -> Result<String, LookupError> {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(key.subject.to_string())
            });
        }
        for i in 0..20 {
            assert!(pool.request(EnrichmentKey::new(format!("p{i}").as_str(), HISTORY)));
        }
        for _ in 0..20 {
            rx.recv_timeout(WAIT).unwrap();
        }
        assert!(pool.wait_idle(WAIT));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(pool.cache().len(), 20);
    }

    #[test]
    fn kinds_run_independently() {
        let (pool, rx) = pool();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let started_rx = Mutex::new(started_rx);
        let started_tx = Mutex::new(started_tx);

        // The history lookup only finishes once the detail lookup has run,
        // which requires a second worker.
        pool.register(HISTORY, move |_: &EnrichmentKey| -> Result<String, LookupError> {
            started_rx
                .lock()
                .unwrap()
                .recv_timeout(WAIT)
                .map(|()| "history".to_owned())
                .map_err(|e| LookupError::Failed(e.to_string()))
        });
        pool.register(DETAIL, move |_: &EnrichmentKey| -> Result<String, LookupError> {
            started_tx.lock().unwrap().send(()).unwrap();
            Ok("detail".to_owned())
        });

        assert!(pool.request(EnrichmentKey::new("p1", HISTORY)));
        assert!(pool.request(EnrichmentKey::new("p1", DETAIL)));
        let mut entries: Vec<_> = (0..2)
            .map(|_| rx.recv_timeout(WAIT).unwrap().entry)
            .collect();
        entries.sort_by_key(|e| format!("{e:?}"));
        assert_eq!(
            entries,
            vec![
                CacheEntry::Ready("detail".into()),
                CacheEntry::Ready("history".into()),
            ]
        );
    }

    #[test]
    fn idle_worker_respawns_on_next_submit() {
        let (pool, rx) = pool();
        pool.register(HISTORY, |key: &EnrichmentKey| -> Result<String, LookupError> {
            Ok(key.subject.to_string())
        });
        assert!(pool.request(EnrichmentKey::new("p1", HISTORY)));
        rx.recv_timeout(WAIT).unwrap();
        assert!(pool.wait_idle(WAIT));

        assert!(pool.request(EnrichmentKey::new("p2", HISTORY)));
        let done = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(done.entry, CacheEntry::Ready("p2".into()));
    }
}
