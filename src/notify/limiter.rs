//! Per (channel, kind) rate limiting for non-critical notifications.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::trigger::{Event, EventKind};

/// Gates non-critical events to one per interval per (channel, kind).
///
/// Buckets are created lazily and never evicted. The key space is bounded by
/// the number of channels times the fixed set of event kinds.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last_emitted: HashMap<(String, EventKind), Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emitted: HashMap::new(),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide whether `event` may be notified now.
    pub fn allow(&mut self, event: &Event) -> bool {
        self.allow_at(event, Instant::now())
    }

    /// Decide whether `event` may be notified at `now`.
    ///
    /// Critical events always pass and leave bucket state untouched.
    pub fn allow_at(&mut self, event: &Event, now: Instant) -> bool {
        if event.critical() {
            return true;
        }

        let key = (event.channel.clone(), event.kind);
        match self.last_emitted.get(&key) {
            Some(last) if now.saturating_duration_since(*last) < self.interval => {
                tracing::debug!(
                    channel = %event.channel,
                    kind = %event.kind,
                    "Notification rate limited"
                );
                false
            }
            _ => {
                self.last_emitted.insert(key, now);
                true
            }
        }
    }

    /// Number of buckets created so far.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.last_emitted.len()
    }
}
