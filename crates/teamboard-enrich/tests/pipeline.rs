//! End-to-end tests for the claim, lookup and completion pipeline.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use teamboard_enrich::{
    CacheEntry, EnrichmentCache, EnrichmentKey, EnrichmentKind, LookupError, WorkerPool,
};

const RUNES: EnrichmentKind = EnrichmentKind::new("runes");
const WAIT: Duration = Duration::from_secs(5);

fn runes_key(champ: &str, role: &str) -> EnrichmentKey {
    EnrichmentKey::new(champ, RUNES).with_selector(Some(role))
}

#[test]
fn racing_requests_trigger_one_lookup() {
    let cache = Arc::new(EnrichmentCache::new());
    let (pool, rx) = WorkerPool::new(Arc::clone(&cache));
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        pool.register(RUNES, move |key: &EnrichmentKey| -> Result<String, LookupError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("page for {key}"))
        });
    }

    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let pool = pool.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.request(runes_key("Ahri", "mid"))
            })
        })
        .collect();
    let granted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&g| g)
        .count();
    assert_eq!(granted, 1);

    let done = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(
        done.entry,
        CacheEntry::Ready("page for runes:Ahri/mid".to_owned())
    );
    assert!(pool.wait_idle(WAIT));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(rx.try_recv().is_err());
}

#[test]
fn selector_change_keeps_old_entry() {
    let cache = Arc::new(EnrichmentCache::new());
    let (pool, rx) = WorkerPool::new(Arc::clone(&cache));
    pool.register(RUNES, |key: &EnrichmentKey| -> Result<String, LookupError> {
        Ok(key.selector.clone().unwrap_or_default())
    });

    assert!(pool.request(runes_key("Ahri", "mid")));
    rx.recv_timeout(WAIT).unwrap();
    assert!(pool.request(runes_key("Ahri", "top")));
    rx.recv_timeout(WAIT).unwrap();

    assert_eq!(cache.get(&runes_key("Ahri", "mid")), CacheEntry::Ready("mid".into()));
    assert_eq!(cache.get(&runes_key("Ahri", "top")), CacheEntry::Ready("top".into()));
    assert!(!pool.request(runes_key("Ahri", "mid")));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_distinct_key_resolves_once(
        requests in prop::collection::vec(("[a-c]", "[xy]"), 1..24),
    ) {
        let cache = Arc::new(EnrichmentCache::new());
        let (pool, rx) = WorkerPool::new(Arc::clone(&cache));
        pool.register(RUNES, |key: &EnrichmentKey| -> Result<String, LookupError> {
            if key.selector.as_deref() == Some("y") {
                Err(LookupError::NoData)
            } else {
                Ok(key.subject.to_string())
            }
        });

        let mut granted = 0;
        for (champ, role) in &requests {
            if pool.request(runes_key(champ, role)) {
                granted += 1;
            }
        }
        let distinct: HashSet<_> = requests.iter().collect();
        prop_assert_eq!(granted, distinct.len());

        let mut seen = HashSet::new();
        for _ in 0..granted {
            let done = rx.recv_timeout(WAIT).unwrap();
            prop_assert!(done.entry.is_resolved());
            prop_assert!(seen.insert(done.key));
        }
        prop_assert!(pool.wait_idle(WAIT));
        prop_assert_eq!(cache.len(), distinct.len());
    }
}
