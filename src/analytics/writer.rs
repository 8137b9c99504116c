//! Single writer task in front of the aggregator.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::trigger::Event;

use super::aggregator::Aggregator;

/// Queue depth between channel workers and the writer.
const QUEUE_CAPACITY: usize = 1024;

/// Shortest period between maintenance passes.
const MIN_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(1);

/// Cheap handle workers use to feed events to the writer.
///
/// Sending never waits: if the writer falls behind, events are dropped with a
/// warning rather than slowing log consumption.
#[derive(Debug, Clone)]
pub struct AnalyticsHandle {
    tx: mpsc::Sender<Event>,
}

impl AnalyticsHandle {
    /// Queue an event for recording.
    pub fn record(&self, event: &Event) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(channel = %event.channel, kind = %event.kind, "Analytics queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Analytics writer stopped, dropping event");
            }
        }
    }
}

/// Start the writer task.
///
/// The task runs until every [`AnalyticsHandle`] is dropped, recording queued
/// events in order and running maintenance every `maintenance_interval`.
/// Storage failures are logged and never stop the task.
#[must_use]
pub fn spawn_writer(
    mut aggregator: Aggregator,
    maintenance_interval: Duration,
    retention_days: u32,
) -> (AnalyticsHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Event>(QUEUE_CAPACITY);

    let task = tokio::spawn(async move {
        // `interval` panics on a zero period.
        let period = maintenance_interval.max(MIN_MAINTENANCE_INTERVAL);
        let mut maintenance = tokio::time::interval(period);
        maintenance.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    if let Err(e) = aggregator.record(&event).await {
                        tracing::error!(
                            channel = %event.channel,
                            kind = %event.kind,
                            error = %e,
                            "Failed to record interview statistics"
                        );
                    }
                }
                _ = maintenance.tick() => {
                    if let Err(e) = aggregator.maintain(Utc::now(), retention_days).await {
                        tracing::error!(error = %e, "Statistics maintenance failed");
                    }
                }
            }
        }

        tracing::debug!(
            pending = aggregator.pending_count(),
            "Analytics writer stopped"
        );
    });

    (AnalyticsHandle { tx }, task)
}
