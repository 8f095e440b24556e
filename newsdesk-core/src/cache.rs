//! Stale-while-revalidate memoization of window fetches.
//!
//! Entries are keyed by the canonical query URL. The policy is explicit:
//! - an entry younger than `max_age` is served without fetching
//! - an older entry is refetched on the next load; until then whatever a view
//!   already shows stays on screen
//! - failures are memoized exactly like values, so a failed fetch is reported
//!   once and not retried until it goes stale or is invalidated
//! - at most `capacity` keys are kept, least recently used evicted first
//!
//! Only the most recently focused key may deliver results to a view. A fetch
//! that completes after the view moved on to another key is still stored but
//! reported as [`Load::Superseded`].

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::error::{NewsdeskError, NewsdeskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub max_age: Duration,
    pub capacity: NonZeroUsize,
    /// How often a long-lived view asks for revalidation.
    pub refresh_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            max_age: Duration::from_secs(300),
            capacity: NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN),
            refresh_interval: Duration::from_secs(30),
        }
    }
}

/// A memoized outcome, shared between the cache and its readers.
pub type Cached<T> = Result<T, Arc<NewsdeskError>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Load<T> {
    Ready(T),
    /// Another key was focused while this one was loading.
    Superseded,
}

/// Identifies which focus a load started under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

struct Entry<T> {
    value: Cached<T>,
    fetched_at: Instant,
}

#[derive(Default)]
struct Focus {
    key: Option<String>,
    generation: u64,
}

pub struct SwrCache<T> {
    policy: CachePolicy,
    entries: Mutex<LruCache<String, Entry<T>>>,
    focus: Mutex<Focus>,
}

impl<T: Clone> SwrCache<T> {
    pub fn new(policy: CachePolicy) -> Self {
        SwrCache {
            entries: Mutex::new(LruCache::new(policy.capacity)),
            focus: Mutex::new(Focus::default()),
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Make `key` the one a view is showing. Refocusing the same key keeps
    /// in-flight loads for it current.
    pub fn focus(&self, key: &str) -> Ticket {
        let mut focus = self.focus.lock();

        if focus.key.as_deref() != Some(key) {
            focus.key = Some(key.to_string());
            focus.generation += 1;
        }

        Ticket(focus.generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.focus.lock().generation == ticket.0
    }

    /// The stored outcome for `key` if it is still fresh.
    pub fn fresh(&self, key: &str) -> Option<Cached<T>> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;

        if entry.fetched_at.elapsed() < self.policy.max_age {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn store(&self, key: &str, value: Cached<T>) {
        self.entries.lock().put(
            key.to_string(),
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop `key` so the next load fetches again. Returns whether it was cached.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Focus `key` and return its outcome, fetching when nothing fresh is
    /// stored.
    pub async fn load<F, Fut>(&self, key: &str, fetch: F) -> Load<Cached<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = NewsdeskResult<T>>,
    {
        let ticket = self.focus(key);

        let value = match self.fresh(key) {
            Some(value) => {
                tracing::debug!(key, "cache hit");
                value
            }
            None => {
                tracing::debug!(key, "cache miss, fetching");
                let value = fetch().await.map_err(Arc::new);
                self.store(key, value.clone());
                value
            }
        };

        if self.is_current(ticket) {
            Load::Ready(value)
        } else {
            tracing::debug!(key, "superseded by a newer key, result ignored");
            Load::Superseded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(max_age: Duration, capacity: usize) -> CachePolicy {
        CachePolicy {
            max_age,
            capacity: NonZeroUsize::new(capacity).unwrap(),
            refresh_interval: Duration::from_secs(30),
        }
    }

    fn ready_value<T>(load: Load<Cached<T>>) -> Option<T> {
        match load {
            Load::Ready(Ok(value)) => Some(value),
            _ => None,
        }
    }

    async fn counted(calls: &AtomicUsize, value: u32) -> NewsdeskResult<u32> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn fresh_entries_are_served_without_fetching() {
        let cache = SwrCache::new(policy(Duration::from_secs(60), 4));
        let calls = AtomicUsize::new(0);

        let first = cache.load("a", || counted(&calls, 1)).await;
        let second = cache.load("a", || counted(&calls, 2)).await;

        assert_eq!(ready_value(first), Some(1));
        assert_eq!(ready_value(second), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entries_are_revalidated() {
        let cache = SwrCache::new(policy(Duration::ZERO, 4));
        let calls = AtomicUsize::new(0);

        cache.load("a", || counted(&calls, 1)).await;
        let second = cache.load("a", || counted(&calls, 2)).await;

        assert_eq!(ready_value(second), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_memoized_until_invalidated() {
        let cache: SwrCache<u32> = SwrCache::new(policy(Duration::from_secs(60), 4));
        let calls = AtomicUsize::new(0);
        let calls_ref = &calls;

        let failing = move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            Err(NewsdeskError::InvalidWindow("boom".into()))
        };

        let Load::Ready(first) = cache.load("a", failing).await else {
            panic!("expected ready");
        };
        assert!(first.is_err());

        let Load::Ready(second) = cache.load("a", failing).await else {
            panic!("expected ready");
        };
        assert!(matches!(
            second.as_ref().map_err(|e| e.as_ref()),
            Err(NewsdeskError::InvalidWindow(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(cache.invalidate("a"));
        let third = cache.load("a", || counted(&calls, 7)).await;
        assert_eq!(ready_value(third), Some(7));
    }

    #[tokio::test]
    async fn least_recently_used_key_is_evicted() {
        let cache = SwrCache::new(policy(Duration::from_secs(60), 2));
        let calls = AtomicUsize::new(0);

        cache.load("a", || counted(&calls, 1)).await;
        cache.load("b", || counted(&calls, 2)).await;
        cache.load("c", || counted(&calls, 3)).await;

        assert_eq!(cache.len(), 2);
        assert!(cache.fresh("a").is_none());
        assert_eq!(cache.fresh("c").and_then(Result::ok), Some(3));
    }

    #[tokio::test]
    async fn last_focused_key_wins() {
        let cache = SwrCache::new(policy(Duration::from_secs(60), 4));
        let gate = tokio::sync::Notify::new();
        let gate_ref = &gate;

        let slow = cache.load("old", move || async move {
            gate_ref.notified().await;
            Ok(1)
        });
        let fast = async {
            let result = cache.load("new", || async { Ok(2) }).await;
            gate_ref.notify_one();
            result
        };

        let (slow, fast) = tokio::join!(slow, fast);

        assert!(matches!(slow, Load::Superseded));
        assert_eq!(ready_value(fast), Some(2));
        // the late result is still kept for its own key
        assert_eq!(cache.fresh("old").and_then(Result::ok), Some(1));
    }

    #[test]
    fn refocusing_same_key_keeps_ticket() {
        let cache: SwrCache<u32> = SwrCache::new(CachePolicy::default());

        let first = cache.focus("a");
        assert_eq!(cache.focus("a"), first);
        assert!(cache.is_current(first));

        cache.focus("b");
        assert!(!cache.is_current(first));

        cache.clear();
        assert!(cache.is_empty());
    }
}
