//! Turns the event stream into interview records.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::trigger::{Event, EventKind, InterviewOutcome};

use super::error::AnalyticsError;
use super::store::AnalyticsStore;
use super::types::{InterviewRecord, PruneReport, QueueSnapshot};

/// Pending interviews are keyed by channel and lowercased nick.
type PendingKey = (String, String);

fn key(channel: &str, nick: &str) -> PendingKey {
    (channel.to_string(), nick.to_lowercase())
}

/// The instant `days` days before `now`.
///
/// # Errors
///
/// Returns `AnalyticsError::WindowOutOfRange` if the result is not a valid date.
pub fn days_before(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, AnalyticsError> {
    chrono::TimeDelta::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(AnalyticsError::WindowOutOfRange { days })
}

/// Result of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Pending interviews finalized as missed.
    pub expired: u64,
    pub pruned: PruneReport,
}

/// Maintains open interview records and writes them to the store.
///
/// Owned by a single writer task, so pending records are never finalized
/// twice.
#[derive(Debug)]
pub struct Aggregator {
    store: AnalyticsStore,
    pending: HashMap<PendingKey, InterviewRecord>,
    pending_timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator, reloading interviews left open by a previous run.
    ///
    /// If a previous run left several open records for the same nick, all but
    /// the newest are finalized as missed.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending records cannot be read or updated.
    pub async fn new(store: AnalyticsStore, pending_timeout: Duration) -> Result<Self, AnalyticsError> {
        let mut aggregator = Self {
            store,
            pending: HashMap::new(),
            pending_timeout,
        };

        let open = aggregator.store.pending_interviews().await?;
        let reloaded = open.len();
        for record in open {
            let at = record.started_at;
            aggregator
                .open(record, at, "Superseded by a later interview")
                .await?;
        }
        if reloaded > 0 {
            tracing::info!(
                reloaded,
                pending = aggregator.pending.len(),
                "Reloaded pending interviews"
            );
        }

        Ok(aggregator)
    }

    #[must_use]
    pub fn store(&self) -> &AnalyticsStore {
        &self.store
    }

    /// Number of interviews awaiting an outcome.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pending record for a nick in a channel.
    #[must_use]
    pub fn pending_for(&self, channel: &str, nick: &str) -> Option<&InterviewRecord> {
        self.pending.get(&key(channel, nick))
    }

    /// Feed one event.
    ///
    /// Every event is considered, whether or not it was notified.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn record(&mut self, event: &Event) -> Result<(), AnalyticsError> {
        if event.starts_interview() {
            let Some(nick) = event.subject.as_deref() else {
                return Ok(());
            };
            let record =
                InterviewRecord::started(&event.channel, nick, event.timestamp, event.queue);
            self.open(record, event.timestamp, "Interview restarted before an outcome")
                .await?;
            if let Some(queue_length) = event.queue {
                self.store
                    .save_snapshot(&QueueSnapshot {
                        channel: event.channel.clone(),
                        timestamp: event.timestamp,
                        queue_length,
                    })
                    .await?;
            }
            return Ok(());
        }

        let outcome = match event.kind {
            EventKind::OutcomeObserved(outcome) => Some(outcome),
            EventKind::Kicked => event.outcome,
            _ => None,
        };
        if let (Some(outcome), Some(nick)) = (outcome, event.subject.as_deref()) {
            self.close(&event.channel, nick, outcome, event.timestamp, &event.raw_line)
                .await?;
        }
        Ok(())
    }

    /// Finalize stale pending interviews as missed, then prune old rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be updated or the retention
    /// window is out of range. Nothing is changed in the latter case.
    pub async fn maintain(
        &mut self,
        now: DateTime<Utc>,
        retention_days: u32,
    ) -> Result<MaintenanceReport, AnalyticsError> {
        let cutoff = days_before(now, retention_days)?;
        let timeout = chrono::Duration::from_std(self.pending_timeout)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        let stale: Vec<PendingKey> = self
            .pending
            .iter()
            .filter(|(_, r)| now.signed_duration_since(r.started_at) >= timeout)
            .map(|(k, _)| k.clone())
            .collect();

        let mut report = MaintenanceReport::default();
        for k in stale {
            if let Some(record) = self.pending.remove(&k) {
                tracing::info!(
                    channel = %record.channel,
                    nick = %record.nick,
                    "No outcome seen, recording interview as missed"
                );
                let record = record.resolved(
                    InterviewOutcome::Missed,
                    now,
                    Some("No outcome observed before timeout".to_string()),
                );
                self.store.save_interview(&record).await?;
                report.expired += 1;
            }
        }

        report.pruned = self.store.prune_before(cutoff).await?;
        if report.pruned.interviews > 0 || report.pruned.snapshots > 0 {
            tracing::info!(
                interviews = report.pruned.interviews,
                snapshots = report.pruned.snapshots,
                retention_days,
                "Pruned old statistics"
            );
        }
        Ok(report)
    }

    /// Persist a new pending record, finalizing any open one for the same key.
    async fn open(
        &mut self,
        record: InterviewRecord,
        at: DateTime<Utc>,
        superseded_reason: &str,
    ) -> Result<(), AnalyticsError> {
        let k = key(&record.channel, &record.nick);
        if let Some(previous) = self.pending.remove(&k) {
            if previous.id != record.id {
                tracing::debug!(
                    channel = %previous.channel,
                    nick = %previous.nick,
                    "Previous interview never resolved, recording as missed"
                );
                let previous = previous.resolved(
                    InterviewOutcome::Missed,
                    at,
                    Some(superseded_reason.to_string()),
                );
                self.store.save_interview(&previous).await?;
            }
        }
        self.store.save_interview(&record).await?;
        self.pending.insert(k, record);
        Ok(())
    }

    async fn close(
        &mut self,
        channel: &str,
        nick: &str,
        outcome: InterviewOutcome,
        at: DateTime<Utc>,
        message: &str,
    ) -> Result<(), AnalyticsError> {
        let record = match self.pending.remove(&key(channel, nick)) {
            Some(record) => record,
            None => {
                tracing::debug!(channel, nick, %outcome, "Outcome without a recorded start");
                InterviewRecord::started(channel, nick, at, None)
            }
        };
        let record = record.resolved(outcome, at, Some(message.trim().to_string()));
        tracing::info!(channel, nick, %outcome, "Interview resolved");
        self.store.save_interview(&record).await
    }
}
