//! Human-readable notification content for events.

use crate::trigger::{Event, EventKind};

/// ntfy priority for alerting notifications.
pub const PRIORITY_URGENT: u8 = 5;
/// ntfy priority for queue loss.
pub const PRIORITY_HIGH: u8 = 4;
/// ntfy default priority.
pub const PRIORITY_DEFAULT: u8 = 3;

/// A notification ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    /// Body text; the raw log line.
    pub message: String,
    pub priority: u8,
    /// ntfy emoji shortcodes.
    pub tags: Vec<String>,
}

impl Notification {
    /// Build the notification for an event.
    #[must_use]
    pub fn for_event(event: &Event) -> Self {
        let (title, tag) = match event.kind {
            EventKind::YourInterview => ("Your interview is happening!".to_string(), "rotating_light"),
            EventKind::InterviewStarted => ("Interview detected".to_string(), "warning"),
            EventKind::Mention => ("You've been mentioned".to_string(), "wave"),
            EventKind::Disconnected => ("You've been disconnected from IRC!".to_string(), "x"),
            EventKind::NetsplitDetected => (
                "Netsplit detected - requeue within 10min!".to_string(),
                "electric_plug",
            ),
            EventKind::NetsplitQueueLoss => (
                match event.queue {
                    Some(position) => format!("Queue position lost to netsplit (now #{position})"),
                    None => "Queue position lost to netsplit".to_string(),
                },
                "chart_with_downwards_trend",
            ),
            EventKind::Kicked => (
                "You've been kicked - rejoin & requeue ASAP!".to_string(),
                "anger",
            ),
            EventKind::OutcomeObserved(outcome) => {
                (format!("Interview outcome: {outcome}"), "clipboard")
            }
        };

        Self {
            title: format!("{title} [{}]", event.channel),
            message: event.raw_line.trim().to_string(),
            priority: priority_for(event.kind),
            tags: vec![tag.to_string()],
        }
    }
}

/// Priority for an event kind.
#[must_use]
pub fn priority_for(kind: EventKind) -> u8 {
    if kind.is_critical() || kind == EventKind::NetsplitDetected {
        PRIORITY_URGENT
    } else if kind == EventKind::NetsplitQueueLoss {
        PRIORITY_HIGH
    } else {
        PRIORITY_DEFAULT
    }
}
