//! Interview records and derived statistics.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trigger::InterviewOutcome;

/// Number of entries reported in [`Stats::busiest_hours`].
pub const BUSIEST_HOURS: usize = 5;

/// One observed interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub id: Uuid,
    pub channel: String,
    /// Nick being interviewed.
    pub nick: String,
    pub started_at: DateTime<Utc>,
    /// Remaining queue length announced with the interview, if any.
    pub queue_length_at_start: Option<u32>,
    /// `None` while the interview is pending.
    pub outcome: Option<InterviewOutcome>,
    pub outcome_at: Option<DateTime<Utc>>,
    /// Kick reason or other text that resolved the interview.
    pub outcome_message: Option<String>,
}

impl InterviewRecord {
    /// Open a pending record.
    #[must_use]
    pub fn started(
        channel: impl Into<String>,
        nick: impl Into<String>,
        started_at: DateTime<Utc>,
        queue_length_at_start: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            nick: nick.into(),
            started_at,
            queue_length_at_start,
            outcome: None,
            outcome_at: None,
            outcome_message: None,
        }
    }

    /// Set the outcome.
    #[must_use]
    pub fn resolved(
        mut self,
        outcome: InterviewOutcome,
        at: DateTime<Utc>,
        message: Option<String>,
    ) -> Self {
        self.outcome = Some(outcome);
        self.outcome_at = Some(at);
        self.outcome_message = message;
        self
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }
}

/// A queue length sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub channel: String,
    pub timestamp: DateTime<Utc>,
    pub queue_length: u32,
}

/// Counts of interviews per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub passed: u64,
    pub failed: u64,
    pub missed: u64,
    pub pending: u64,
}

impl OutcomeCounts {
    /// Interviews with a known outcome.
    #[must_use]
    pub fn resolved(&self) -> u64 {
        self.passed + self.failed + self.missed
    }

    fn add(&mut self, outcome: Option<InterviewOutcome>) {
        match outcome {
            Some(InterviewOutcome::Passed) => self.passed += 1,
            Some(InterviewOutcome::Failed) => self.failed += 1,
            Some(InterviewOutcome::Missed) => self.missed += 1,
            None => self.pending += 1,
        }
    }
}

/// Share of resolved interviews per outcome, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomePercentages {
    pub passed: f64,
    pub failed: f64,
    pub missed: f64,
}

/// Statistics over a time window, computed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Start of the window.
    pub since: DateTime<Utc>,
    /// Channel filter, if any.
    pub channel: Option<String>,
    /// Interviews started in the window.
    pub total: u64,
    pub outcomes: OutcomeCounts,
    pub percentages: OutcomePercentages,
    /// Passed share of resolved interviews, rounded to one decimal.
    pub pass_rate: f64,
    pub avg_queue_length: Option<f64>,
    /// Interview starts per UTC hour of day.
    pub hourly: [u64; 24],
    /// Up to five `(hour, count)` pairs, busiest first.
    pub busiest_hours: Vec<(u32, u64)>,
}

impl Stats {
    /// Compute statistics for records started at or after `since`.
    ///
    /// Records outside the window or the channel filter are ignored.
    #[must_use]
    pub fn compute(records: &[InterviewRecord], since: DateTime<Utc>, channel: Option<&str>) -> Self {
        let mut outcomes = OutcomeCounts::default();
        let mut hourly = [0u64; 24];
        let mut queue_sum = 0u64;
        let mut queue_samples = 0u64;
        let mut total = 0u64;

        for record in records
            .iter()
            .filter(|r| r.started_at >= since)
            .filter(|r| channel.is_none_or(|c| r.channel == c))
        {
            total += 1;
            outcomes.add(record.outcome);
            hourly[record.started_at.hour() as usize] += 1;
            if let Some(queue) = record.queue_length_at_start {
                queue_sum += u64::from(queue);
                queue_samples += 1;
            }
        }

        let resolved = outcomes.resolved();
        let percentages = OutcomePercentages {
            passed: percent(outcomes.passed, resolved),
            failed: percent(outcomes.failed, resolved),
            missed: percent(outcomes.missed, resolved),
        };

        #[allow(clippy::cast_precision_loss)]
        let avg_queue_length =
            (queue_samples > 0).then(|| round1(queue_sum as f64 / queue_samples as f64));

        Self {
            since,
            channel: channel.map(String::from),
            total,
            outcomes,
            pass_rate: round1(percentages.passed),
            percentages,
            avg_queue_length,
            busiest_hours: busiest_hours(&hourly),
            hourly,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn busiest_hours(hourly: &[u64; 24]) -> Vec<(u32, u64)> {
    let mut hours: Vec<(u32, u64)> = (0u32..)
        .zip(hourly.iter().copied())
        .filter(|&(_, count)| count > 0)
        .collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hours.truncate(BUSIEST_HOURS);
    hours
}

/// Rows removed by a maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    pub interviews: u64,
    pub snapshots: u64,
}
