//! Whole-collection read-through cache.
//!
//! Holds at most one snapshot of "every record of type T" together with the
//! instant it was fetched. There are no per-key entries: a write anywhere in
//! the collection drops the snapshot and the next read refetches everything.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::Clock;

struct Snapshot<T> {
    items: Arc<Vec<T>>,
    fetched_at: DateTime<Utc>,
}

struct CacheState<T> {
    snapshot: Option<Snapshot<T>>,
    generation: u64,
}

/// Handed out when a fill starts; a fill only lands if no invalidation
/// happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(u64);

pub struct ListCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState<T>>,
}

impl<T> ListCache<T> {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(5));
        Self {
            ttl,
            clock,
            state: Mutex::new(CacheState {
                snapshot: None,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The cached list, if one exists and is younger than the TTL.
    pub fn fresh(&self) -> Option<Arc<Vec<T>>> {
        let now = self.clock.now();
        let state = self.lock();
        state
            .snapshot
            .as_ref()
            .filter(|snapshot| now - snapshot.fetched_at < self.ttl)
            .map(|snapshot| Arc::clone(&snapshot.items))
    }

    pub fn begin_fill(&self) -> FillTicket {
        FillTicket(self.lock().generation)
    }

    /// Store a freshly fetched list unless the cache was invalidated after
    /// `ticket` was issued. The list is returned to the caller either way.
    pub fn complete_fill(&self, ticket: FillTicket, items: Vec<T>) -> Arc<Vec<T>> {
        let items = Arc::new(items);
        let now = self.clock.now();
        let mut state = self.lock();

        if state.generation == ticket.0 {
            state.snapshot = Some(Snapshot {
                items: Arc::clone(&items),
                fetched_at: now,
            });
        } else {
            tracing::debug!(
                ticket = ticket.0,
                current = state.generation,
                "discarding stale cache fill"
            );
        }

        items
    }

    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.snapshot = None;
        state.generation = state.generation.wrapping_add(1);
    }

    /// Return the cached list, or run `fetch` and cache what it returns.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(items) = self.fresh() {
            return Ok(items);
        }

        let ticket = self.begin_fill();
        let items = fetch().await?;
        Ok(self.complete_fill(ticket, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache(clock: Arc<ManualClock>) -> ListCache<u32> {
        ListCache::new(std::time::Duration::from_secs(300), clock)
    }

    async fn counted_fetch(calls: &AtomicUsize) -> Result<Vec<u32>, ()> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![3, 2, 1])
    }

    #[tokio::test]
    async fn repeated_reads_within_ttl_share_one_list() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock.clone());
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_fetch(|| counted_fetch(&calls)).await.unwrap();
        clock.advance(Duration::minutes(4));
        let second = cache.get_or_fetch(|| counted_fetch(&calls)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_snapshot_is_refetched() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock.clone());
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_fetch(|| counted_fetch(&calls)).await.unwrap();
        clock.advance(Duration::minutes(5));
        let second = cache.get_or_fetch(|| counted_fetch(&calls)).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_forces_exactly_one_refetch() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock);
        let calls = AtomicUsize::new(0);

        cache.get_or_fetch(|| counted_fetch(&calls)).await.unwrap();
        cache.invalidate();
        cache.get_or_fetch(|| counted_fetch(&calls)).await.unwrap();
        cache.get_or_fetch(|| counted_fetch(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fill_started_before_invalidation_is_not_stored() {
        let cache = cache(Arc::new(ManualClock::default()));

        let stale = cache.begin_fill();
        cache.invalidate();
        let returned = cache.complete_fill(stale, vec![1]);

        assert_eq!(*returned, vec![1]);
        assert!(cache.fresh().is_none());

        let current = cache.begin_fill();
        cache.complete_fill(current, vec![2]);
        assert_eq!(*cache.fresh().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cache_empty() {
        let cache = cache(Arc::new(ManualClock::default()));

        let result = cache
            .get_or_fetch(|| async { Err::<Vec<u32>, _>("backend down") })
            .await;

        assert_eq!(result.unwrap_err(), "backend down");
        assert!(cache.fresh().is_none());
    }
}
