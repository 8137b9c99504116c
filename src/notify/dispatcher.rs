//! Notification dispatcher: rate limiting, delivery, history.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::trigger::Event;

use super::error::NotifyError;
use super::history::{DeliveryStatus, HistoryLog};
use super::limiter::RateLimiter;
use super::message::Notification;
use super::transport::Transport;

/// Turns events into transport calls.
///
/// Shared by all channel workers. The rate limiter sits behind a mutex, which
/// is the serialization point if two sources ever report the same channel.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    limiter: Mutex<RateLimiter>,
    history: Option<HistoryLog>,
    timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("history", &self.history)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, rate_limit: Duration, timeout: Duration) -> Self {
        Self {
            transport,
            limiter: Mutex::new(RateLimiter::new(rate_limit)),
            history: None,
            timeout,
        }
    }

    /// Record every attempt to `history`.
    #[must_use]
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    /// Dispatch one event.
    ///
    /// Returns `None` for events that are never notified. Delivery failures
    /// are logged and reported in the status, never retried.
    pub async fn dispatch(&self, event: &Event) -> Option<DeliveryStatus> {
        self.dispatch_at(event, Instant::now()).await
    }

    /// Dispatch one event, rate limiting as of `now`.
    pub async fn dispatch_at(&self, event: &Event, now: Instant) -> Option<DeliveryStatus> {
        if !event.kind.is_notifiable() {
            return None;
        }

        let notification = Notification::for_event(event);
        let allowed = self.limiter.lock().await.allow_at(event, now);

        let status = if allowed {
            match self.deliver(&notification).await {
                Ok(()) => {
                    tracing::info!(
                        channel = %event.channel,
                        kind = %event.kind,
                        priority = notification.priority,
                        "Notification sent"
                    );
                    DeliveryStatus::Sent
                }
                Err(e) => {
                    tracing::error!(
                        channel = %event.channel,
                        kind = %event.kind,
                        error = %e,
                        "Notification failed"
                    );
                    DeliveryStatus::Failed
                }
            }
        } else {
            DeliveryStatus::Suppressed
        };

        if let Some(history) = &self.history {
            if let Err(e) = history.append(event, &notification, status).await {
                tracing::warn!(error = %e, "Failed to record notification history");
            }
        }

        Some(status)
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        tokio::time::timeout(self.timeout, self.transport.send(notification))
            .await
            .map_err(|_| NotifyError::Timeout)?
    }
}
