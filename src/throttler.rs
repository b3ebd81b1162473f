use std::time::{Duration, Instant};

use crate::cooldown::CooldownTracker;
use crate::error::{Error, Result};
use crate::token_store::{Take, TokenStore};

/// Snapshot of an active cooldown, for rendering a retry hint.
#[derive(Debug, Clone, Copy)]
pub struct CooldownStatus {
    pub expires_at: Instant,
    pub capacity: u64,
    pub interval: Duration,
}

/// Request limiter for one process: token accounting per subnet plus the
/// cooldown blackout applied once a subnet drains its window.
///
/// The two state machines stay independent. Spending tokens never touches
/// cooldown state, and the decision to black a subnet out belongs to the
/// caller, who triggers `cooldown_subnet` after a take that drained the
/// window.
#[derive(Debug)]
pub struct Throttler {
    tokens: TokenStore,
    cooldowns: CooldownTracker,
    cooldown_duration: Duration,
}

impl Throttler {
    pub fn new(capacity: u64, interval: Duration, cooldown: Duration) -> Result<Self> {
        if cooldown.is_zero() {
            return Err(Error::InvalidConfiguration("cooldown must be non-zero"));
        }

        Ok(Self {
            tokens: TokenStore::new(capacity, interval)?,
            cooldowns: CooldownTracker::new(),
            cooldown_duration: cooldown,
        })
    }

    /// True while the subnet is blacked out.
    pub fn is_timed_out(&self, key: &str) -> bool {
        self.cooldowns.is_timed_out(key)
    }

    /// Spends one token from the subnet's window. A successful take with
    /// zero remaining means the window is drained; the caller decides
    /// whether that starts a cooldown.
    pub async fn take(&self, key: &str) -> Result<Take> {
        self.tokens.take(key).await
    }

    /// Blacks the subnet out for the configured cooldown. Repeat triggers
    /// replace the deadline.
    pub fn cooldown_subnet(&self, key: &str) {
        self.cooldowns.cooldown(key, self.cooldown_duration);
    }

    /// Deadline and allowance of an active cooldown.
    pub fn get(&self, key: &str) -> Result<CooldownStatus> {
        let expires_at = self.cooldowns.get(key)?;

        Ok(CooldownStatus {
            expires_at,
            capacity: self.tokens.capacity(),
            interval: self.tokens.interval(),
        })
    }

    /// Operator unblock: refills the subnet's window, then lifts its
    /// cooldown. A subnet that has never spent a token fails with
    /// `UnknownKey` and keeps whatever cooldown it had.
    pub async fn reset(&self, key: &str) -> Result<()> {
        self.tokens.reset(key).await?;
        self.cooldowns.reset(key);
        Ok(())
    }

    /// Shuts the limiter down and drops all state. Idempotent. There is no
    /// background work to drain, so this returns promptly even under a
    /// caller-imposed deadline.
    pub async fn close(&self) -> Result<()> {
        self.tokens.close().await?;
        self.cooldowns.clear();
        Ok(())
    }
}
