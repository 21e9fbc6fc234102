//! In-memory URL content cache with time-based expiry
//!
//! `ContentCache` memoizes raw response bodies keyed by URL. A lookup serves the
//! stored body while its entry is fresh, refetches once it has expired, and
//! falls back to the previously stored body when the refetch fails. Entries are
//! never evicted; they are overwritten in place on every refresh.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use crate::fetch::Fetcher;

/// A stored response body and the instant after which it should be refetched
#[derive(Debug, Clone)]
struct CacheEntry {
    content: Bytes,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Fetched live during this call
    Fresh(Bytes),
    /// Served from an entry that had not yet expired
    Cached(Bytes),
    /// The live fetch failed; this is the last body stored for the URL
    Stale(Bytes),
    /// The live fetch failed and nothing has ever been stored for the URL
    Unavailable,
}

impl Content {
    /// The payload, or an empty slice for [`Content::Unavailable`]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Content::Fresh(b) | Content::Cached(b) | Content::Stale(b) => &b[..],
            Content::Unavailable => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Content::Unavailable)
    }

    /// Short label describing where the content came from
    pub fn source(&self) -> &'static str {
        match self {
            Content::Fresh(_) => "fresh",
            Content::Cached(_) => "cached",
            Content::Stale(_) => "stale",
            Content::Unavailable => "unavailable",
        }
    }
}

/// Process-lifetime cache of URL response bodies
///
/// Construct one per process (or per test) and share it behind an `Arc`.
/// Concurrent lookups of the same expired URL are coalesced: one caller
/// fetches while the others wait, then share that fetch's outcome.
pub struct ContentCache<F, C = SystemClock> {
    fetcher: F,
    clock: C,
    default_duration: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<Flight>>>,
}

/// Per-URL fetch coordination
///
/// `completed` is bumped while the lock is held, after `outcome` is written.
/// A caller that sees the counter move while it waited queued behind a
/// finished fetch and takes that fetch's outcome instead of fetching again.
#[derive(Default)]
struct Flight {
    completed: AtomicU64,
    outcome: tokio::sync::Mutex<Option<Content>>,
}

impl<F: Fetcher> ContentCache<F, SystemClock> {
    /// Creates an empty cache using wall-clock time
    pub fn new(fetcher: F, default_duration: Duration) -> Self {
        Self::with_clock(fetcher, SystemClock, default_duration)
    }
}

impl<F: Fetcher, C: Clock> ContentCache<F, C> {
    /// Creates an empty cache driven by a custom clock
    pub fn with_clock(fetcher: F, clock: C, default_duration: Duration) -> Self {
        Self {
            fetcher,
            clock,
            default_duration,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The TTL applied by [`ContentCache::fetch`]
    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Looks up `url` using the default duration
    pub async fn fetch(&self, url: &str) -> Content {
        self.fetch_or_cached(url, self.default_duration).await
    }

    /// Returns the content for `url`, fetching it when the entry is stale
    ///
    /// Whatever content is returned, the entry's expiry is pushed to
    /// `now + duration`, so cache hits and stale fallbacks both start a new
    /// window. A failed fetch with no stored entry yields
    /// [`Content::Unavailable`] and leaves the cache untouched so the next
    /// call tries again. Fetch failures are never returned to the caller.
    pub async fn fetch_or_cached(&self, url: &str, duration: Duration) -> Content {
        if let Some(content) = self.take_fresh(url, duration) {
            debug!(url = %url, "Cache hit");
            return Content::Cached(content);
        }

        let flight = self.flight(url);
        let seen = flight.completed.load(Ordering::SeqCst);
        let mut outcome = flight.outcome.lock().await;

        if flight.completed.load(Ordering::SeqCst) != seen {
            return self.join_finished(url, duration, outcome.as_ref());
        }

        // An entry refreshed before we looked up the flight
        if let Some(content) = self.take_fresh(url, duration) {
            debug!(url = %url, "Cache refreshed by concurrent fetch");
            return Content::Cached(content);
        }

        debug!(url = %url, "Cache miss, fetching");
        let content = match self.fetcher.get(url).await {
            Ok(content) => {
                self.store(url, content.clone(), duration);
                Content::Fresh(content)
            }
            Err(err) => {
                warn!(url = %url, error = %err, "Failed to fetch");
                match self.renew(url, duration) {
                    Some(content) => {
                        debug!(url = %url, "Using stale cached content");
                        Content::Stale(content)
                    }
                    None => {
                        warn!(url = %url, "No cached content to fall back to");
                        Content::Unavailable
                    }
                }
            }
        };

        *outcome = Some(content.clone());
        flight.completed.fetch_add(1, Ordering::SeqCst);
        content
    }

    /// Resolves a caller that waited behind a fetch which has since finished
    fn join_finished(&self, url: &str, duration: Duration, outcome: Option<&Content>) -> Content {
        match outcome {
            Some(Content::Unavailable) | None => {
                debug!(url = %url, "Concurrent fetch found no content");
                Content::Unavailable
            }
            Some(Content::Stale(_)) => match self.renew(url, duration) {
                Some(content) => Content::Stale(content),
                None => Content::Unavailable,
            },
            Some(Content::Fresh(_) | Content::Cached(_)) => match self.renew(url, duration) {
                Some(content) => {
                    debug!(url = %url, "Cache refreshed by concurrent fetch");
                    Content::Cached(content)
                }
                None => Content::Unavailable,
            },
        }
    }

    /// When the entry for `url` expires, if there is one
    pub fn expires_at(&self, url: &str) -> Option<DateTime<Utc>> {
        self.entries().get(url).map(|e| e.expires_at)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flight(&self, url: &str) -> Arc<Flight> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.entry(url.to_string()).or_default().clone()
    }

    fn expiry(&self, now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(duration)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns the stored content if the entry is fresh, renewing its expiry
    fn take_fresh(&self, url: &str, duration: Duration) -> Option<Bytes> {
        let now = self.clock.now();
        let expires_at = self.expiry(now, duration);
        let mut entries = self.entries();
        let entry = entries.get_mut(url).filter(|e| !e.is_stale(now))?;
        entry.expires_at = expires_at;
        Some(entry.content.clone())
    }

    /// Renews the expiry of an existing entry regardless of staleness
    fn renew(&self, url: &str, duration: Duration) -> Option<Bytes> {
        let expires_at = self.expiry(self.clock.now(), duration);
        let mut entries = self.entries();
        let entry = entries.get_mut(url)?;
        entry.expires_at = expires_at;
        Some(entry.content.clone())
    }

    fn store(&self, url: &str, content: Bytes, duration: Duration) {
        let expires_at = self.expiry(self.clock.now(), duration);
        let mut entries = self.entries();
        match entries.get_mut(url) {
            Some(entry) => {
                entry.content = content;
                entry.expires_at = expires_at;
            }
            None => {
                debug!(url = %url, "New cache entry");
                entries.insert(url.to_string(), CacheEntry { content, expires_at });
            }
        }
    }
}

impl<F, C> std::fmt::Debug for ContentCache<F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .entries
            .lock()
            .map(|e| e.len())
            .unwrap_or_else(|p| p.into_inner().len());
        f.debug_struct("ContentCache")
            .field("default_duration", &self.default_duration)
            .field("entries", &len)
            .finish()
    }
}
