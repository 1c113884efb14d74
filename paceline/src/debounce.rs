//! Identity-keyed suppression filter with per-entry expiry.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// Suppresses repeat observations of a key within a time window.
///
/// [`filter`] reports whether a key is already tracked (suppress) and starts
/// tracking it otherwise (proceed); entries expire individually. Keys only
/// need `Eq + Hash + Clone` — the expiry index orders entries by
/// `(expiry, tie-break counter)` and never compares two keys against each
/// other, so unorderable identities are fine even on platforms whose clock
/// is coarser than the call rate.
///
/// Time comes from the monotonic [`tokio::time::Instant`] clock, so the
/// paused test clock drives it too.
///
/// [`filter`]: Debouncer::filter
pub struct Debouncer<K> {
    /// Current expiry for each tracked key.
    expiries: HashMap<K, Instant>,
    /// Sorted ascending by `(Reverse(expires_at), tie_break)`: the most
    /// overdue entries sit at the tail, where removal is O(1).
    index: Vec<IndexEntry<K>>,
    last_now: Option<Instant>,
    tie_break: u64,
}

struct IndexEntry<K> {
    expires_at: Instant,
    tie_break: u64,
    key: K,
}

impl<K> Debouncer<K> {
    /// Creates an empty debouncer.
    pub fn new() -> Self {
        Self {
            expiries: HashMap::new(),
            index: Vec::new(),
            last_now: None,
            tie_break: 0,
        }
    }

    /// Number of tracked (unexpired at last cleaning) keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` when no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    /// Purges every entry whose expiry has passed, as of now.
    pub fn clean(&mut self) {
        self.clean_at(Instant::now());
    }

    /// Purges every entry whose expiry is at or before `now`.
    pub fn clean_at(&mut self, now: Instant) {
        let mut purged = 0_usize;
        while self.index.last().map_or(false, |entry| entry.expires_at <= now) {
            if let Some(entry) = self.index.pop() {
                self.expiries.remove(&entry.key);
                purged += 1;
            }
        }
        if purged > 0 {
            tracing::trace!(purged, tracked = self.index.len(), "debounce entries expired");
        }
    }

    /// Reports whether `key` is tracked and unexpired, as of now.
    ///
    /// Cleans expired entries first but never starts tracking anything.
    pub fn is_filtered(&mut self, key: &K) -> bool {
        self.is_filtered_at(key, Instant::now())
    }

    /// Reports whether `key` is tracked and unexpired, as of `now`.
    pub fn is_filtered_at(&mut self, key: &K, now: Instant) -> bool {
        self.clean_at(now);
        self.expiries.contains_key(key)
    }

    /// Returns `true` if `key` is already tracked (the caller should
    /// suppress its action); otherwise starts tracking it until `expire_in`
    /// from now and returns `false` (the caller should proceed).
    pub fn filter(&mut self, key: K, expire_in: Duration) -> bool {
        let now = Instant::now();

        // The tie-break counter resets whenever the observed clock advances,
        // and totally orders entries sharing one coarse clock reading.
        if self.last_now.map_or(true, |last| now > last) {
            self.last_now = Some(now);
            self.tie_break = 0;
        }
        self.tie_break += 1;

        if self.is_filtered_at(&key, now) {
            return true;
        }

        let expires_at = now + expire_in;
        let position = self.index.partition_point(|entry| {
            (Reverse(entry.expires_at), entry.tie_break) <= (Reverse(expires_at), self.tie_break)
        });
        self.index.insert(
            position,
            IndexEntry {
                expires_at,
                tie_break: self.tie_break,
                key: key.clone(),
            },
        );
        self.expiries.insert(key, expires_at);
        false
    }
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for Debouncer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("tracked", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Index internals: most overdue entries must surface at the tail, with
    // the tie-break keeping same-instant entries distinct.
    #[tokio::test(start_paused = true)]
    async fn index_keeps_most_overdue_at_tail() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.filter("slow", Duration::from_secs(10)));
        assert!(!debouncer.filter("fast", Duration::from_secs(1)));
        assert!(!debouncer.filter("mid", Duration::from_secs(5)));

        let tail: Vec<_> = debouncer.index.iter().map(|e| e.key).collect();
        assert_eq!(tail, ["slow", "mid", "fast"]);
    }

    #[tokio::test(start_paused = true)]
    async fn tie_break_resets_when_clock_advances() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.filter("a", Duration::from_secs(1)));
        assert!(!debouncer.filter("b", Duration::from_secs(1)));
        assert_eq!(debouncer.tie_break, 2);

        tokio::time::advance(Duration::from_millis(10)).await;
        assert!(!debouncer.filter("c", Duration::from_secs(1)));
        assert_eq!(debouncer.tie_break, 1);
    }
}
