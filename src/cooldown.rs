use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct CooldownState {
    expires_at: Option<Instant>,
}

/// Per-key blackout bookkeeping. A key is in cooldown while its stored
/// deadline lies in the future; expiry is judged lazily at read time and
/// nothing runs in the background. Entries are overwritten in place, never
/// deleted, so a lapsed cooldown simply reads as inactive.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    entries: DashMap<String, CooldownState>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Blacks the key out until `duration` from now. A key already in
    /// cooldown gets its deadline replaced by the new one.
    pub fn cooldown(&self, key: &str, duration: Duration) {
        let state = CooldownState {
            expires_at: Some(Instant::now() + duration),
        };
        self.entries.insert(key.to_string(), state);
    }

    /// True while the key's deadline lies in the future.
    pub fn is_timed_out(&self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(state) => match state.expires_at {
                Some(expires_at) => Instant::now() < expires_at,
                None => false,
            },
            None => false,
        }
    }

    /// Deadline of an active cooldown. A key that was never cooled down, was
    /// reset, or whose cooldown has lapsed is reported as not in cooldown.
    pub fn get(&self, key: &str) -> Result<Instant> {
        let state = self
            .entries
            .get(key)
            .ok_or_else(|| Error::NotInCooldown(key.to_string()))?;

        match state.expires_at {
            Some(expires_at) if Instant::now() < expires_at => Ok(expires_at),
            _ => Err(Error::NotInCooldown(key.to_string())),
        }
    }

    /// Lifts the key's cooldown immediately.
    pub fn reset(&self, key: &str) {
        if let Some(mut state) = self.entries.get_mut(key) {
            state.expires_at = None;
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn test_unseen_key_is_not_timed_out() {
        let tracker = CooldownTracker::new();

        assert!(!tracker.is_timed_out("10.0.0.0"));
        assert!(matches!(
            tracker.get("10.0.0.0"),
            Err(Error::NotInCooldown(_))
        ));
    }

    #[test]
    fn test_cooldown_marks_key_timed_out() {
        let tracker = CooldownTracker::new();

        tracker.cooldown("10.0.0.0", Duration::from_secs(60));

        assert!(tracker.is_timed_out("10.0.0.0"));
        assert!(tracker.get("10.0.0.0").is_ok());
        assert!(!tracker.is_timed_out("10.0.1.0"));
    }

    #[tokio::test]
    async fn test_cooldown_expires_without_reset() {
        let tracker = CooldownTracker::new();

        tracker.cooldown("10.0.0.0", Duration::from_millis(50));
        assert!(tracker.is_timed_out("10.0.0.0"));

        sleep(Duration::from_millis(60)).await;

        assert!(!tracker.is_timed_out("10.0.0.0"));
        assert!(matches!(
            tracker.get("10.0.0.0"),
            Err(Error::NotInCooldown(_))
        ));
    }

    #[test]
    fn test_retrigger_replaces_deadline() {
        let tracker = CooldownTracker::new();

        tracker.cooldown("10.0.0.0", Duration::from_millis(40));
        let first = tracker.get("10.0.0.0").unwrap();

        tracker.cooldown("10.0.0.0", Duration::from_millis(400));
        let second = tracker.get("10.0.0.0").unwrap();

        assert!(second > first);
    }

    #[test]
    fn test_reset_lifts_cooldown_immediately() {
        let tracker = CooldownTracker::new();

        tracker.cooldown("10.0.0.0", Duration::from_secs(60));
        tracker.reset("10.0.0.0");

        assert!(!tracker.is_timed_out("10.0.0.0"));
        assert!(matches!(
            tracker.get("10.0.0.0"),
            Err(Error::NotInCooldown(_))
        ));
    }
}
