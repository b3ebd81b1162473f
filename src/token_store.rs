use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::{Error, Result};

/// Outcome of a single take, seen after the decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Take {
    pub allowed: bool,
    pub remaining: u64,
}

#[derive(Debug, Clone, Copy)]
struct TokenState {
    remaining: u64,
    window_start: Instant,
}

/// Fixed-window token accounting, one window per key. Windows are created
/// lazily on first take and restarted in place once the interval elapses;
/// entries are never evicted while the store is open.
#[derive(Debug)]
pub struct TokenStore {
    buckets: DashMap<String, TokenState>,
    capacity: u64,
    interval: Duration,
    closed: AtomicBool,
}

impl TokenStore {
    pub fn new(capacity: u64, interval: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfiguration("capacity must be at least 1"));
        }
        if interval.is_zero() {
            return Err(Error::InvalidConfiguration("interval must be non-zero"));
        }

        Ok(Self {
            buckets: DashMap::new(),
            capacity,
            interval,
            closed: AtomicBool::new(false),
        })
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spends one token from the key's current window. The map entry guard
    /// makes the read-modify-write atomic per key, so concurrent takes can
    /// never hand out more than `capacity` tokens per window.
    pub async fn take(&self, key: &str) -> Result<Take> {
        self.guard(key)?;

        let now = Instant::now();
        let mut state = self.buckets.entry(key.to_string()).or_insert(TokenState {
            remaining: self.capacity,
            window_start: now,
        });

        if now.duration_since(state.window_start) >= self.interval {
            state.remaining = self.capacity;
            state.window_start = now;
        }

        if state.remaining > 0 {
            state.remaining -= 1;
            Ok(Take {
                allowed: true,
                remaining: state.remaining,
            })
        } else {
            Ok(Take {
                allowed: false,
                remaining: 0,
            })
        }
    }

    /// Restores the key to a full, fresh window. Unlike `take` this never
    /// creates state: a key nobody has taken from is reported as unknown.
    pub async fn reset(&self, key: &str) -> Result<()> {
        self.guard(key)?;

        match self.buckets.get_mut(key) {
            Some(mut state) => {
                state.remaining = self.capacity;
                state.window_start = Instant::now();
                Ok(())
            }
            None => Err(Error::UnknownKey(key.to_string())),
        }
    }

    /// Marks the store closed and drops all per-key state. Idempotent, and
    /// safe alongside in-flight takes: they either finish against the old
    /// state or fail the closed check.
    pub async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.buckets.clear();
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn guard(&self, key: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::StoreClosed);
        }
        if key.is_empty() {
            return Err(Error::InvalidKey);
        }
        Ok(())
    }
}
