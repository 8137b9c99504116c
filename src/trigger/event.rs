//! Events produced by the trigger classifier.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of an interview, as announced by the gatekeeper bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewOutcome {
    Passed,
    Failed,
    Missed,
}

impl InterviewOutcome {
    /// Returns the string representation for database storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Missed => "missed",
        }
    }

    /// Parse the database representation.
    #[must_use]
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "missed" => Some(Self::Missed),
            _ => None,
        }
    }

    /// Classify a kick reason into an outcome.
    ///
    /// Matching is case-insensitive on the phrases the gatekeeper bots use.
    #[must_use]
    pub fn from_kick_reason(reason: &str) -> Option<Self> {
        let reason = reason.to_lowercase();
        if reason.contains("congratulations") && reason.contains("welcome to") {
            Some(Self::Passed)
        } else if reason.contains("not passed the interview") || reason.contains("you have not passed")
        {
            Some(Self::Failed)
        } else if reason.contains("missed your interview") || reason.contains("interview missed") {
            Some(Self::Missed)
        } else {
            None
        }
    }
}

impl fmt::Display for InterviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a detected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Someone else is being interviewed.
    InterviewStarted,
    /// The configured nick is being interviewed.
    YourInterview,
    /// The configured nick was mentioned in chat.
    Mention,
    /// The client lost its connection (or went silent).
    Disconnected,
    /// A netsplit was observed in the channel.
    NetsplitDetected,
    /// The queue position worsened right after a netsplit.
    NetsplitQueueLoss,
    /// The configured nick was kicked.
    Kicked,
    /// An interview outcome for some nick; analytics only.
    OutcomeObserved(InterviewOutcome),
}

impl EventKind {
    /// Whether this kind bypasses rate limiting.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::YourInterview | Self::Disconnected | Self::Kicked)
    }

    /// Whether this kind produces a push notification at all.
    #[must_use]
    pub fn is_notifiable(&self) -> bool {
        !matches!(self, Self::OutcomeObserved(_))
    }

    /// Stable name used in logs, history lines and rate-limit buckets.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InterviewStarted => "interview",
            Self::YourInterview => "your_interview",
            Self::Mention => "mention",
            Self::Disconnected => "disconnect",
            Self::NetsplitDetected => "netsplit",
            Self::NetsplitQueueLoss => "netsplit_queue_loss",
            Self::Kicked => "kick",
            Self::OutcomeObserved(_) => "outcome",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutcomeObserved(outcome) => write!(f, "outcome:{outcome}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// An immutable record of something detected in a log line.
#[derive(Debug, Clone)]
pub struct Event {
    /// What was detected.
    pub kind: EventKind,
    /// Channel label of the watched source.
    pub channel: String,
    /// Wall-clock detection time.
    pub timestamp: DateTime<Utc>,
    /// Monotonic detection time.
    pub detected_at: Instant,
    /// Nick the event is about, when applicable.
    pub subject: Option<String>,
    /// Queue length at interview start, or queue position.
    pub queue: Option<u32>,
    /// Outcome carried by the line, if any.
    pub outcome: Option<InterviewOutcome>,
    /// The line the event was derived from.
    pub raw_line: String,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(kind: EventKind, channel: impl Into<String>, raw_line: impl Into<String>) -> Self {
        Self {
            kind,
            channel: channel.into(),
            timestamp: Utc::now(),
            detected_at: Instant::now(),
            subject: None,
            queue: None,
            outcome: match kind {
                EventKind::OutcomeObserved(outcome) => Some(outcome),
                _ => None,
            },
            raw_line: raw_line.into(),
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_queue(mut self, queue: Option<u32>) -> Self {
        self.queue = queue;
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Option<InterviewOutcome>) -> Self {
        self.outcome = outcome;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the event is exempt from rate limiting.
    #[must_use]
    pub fn critical(&self) -> bool {
        self.kind.is_critical()
    }

    /// Whether the event opens an interview record for analytics.
    #[must_use]
    pub fn starts_interview(&self) -> bool {
        matches!(
            self.kind,
            EventKind::InterviewStarted | EventKind::YourInterview
        )
    }
}
