//! Line classifier: raw transcript line in, at most one event out.

use std::time::{Duration, Instant};

use regex::Captures;

use super::error::TriggerError;
use super::event::{Event, EventKind, InterviewOutcome};
use super::line::LineView;
use super::rules::{Mode, RuleKind, RuleScope, RuleTable, TriggerRule};
use super::session::SessionState;

/// Settings shared by every channel's classifier.
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// The user's IRC nick.
    pub nick: String,
    /// Nicks whose lines count as bot announcements.
    pub bot_nicks: Vec<String>,
    /// Restrict announcement rules to bot lines.
    pub check_bot_nicks: bool,
    /// Rule table to use.
    pub mode: Mode,
    /// Quiet period after which the client is considered disconnected.
    pub silence_threshold: Option<Duration>,
}

/// Outcome of applying one rule to a line.
enum Claim {
    /// The rule does not apply after all; keep looking.
    Pass,
    /// The rule owns the line, with or without an event.
    Claimed(Option<Event>),
}

/// Classifies lines for one channel.
#[derive(Debug, Clone)]
pub struct TriggerClassifier {
    channel: String,
    nick: String,
    bot_nicks: Vec<String>,
    check_bot_nicks: bool,
    silence_threshold: Option<Duration>,
    table: RuleTable,
}

impl TriggerClassifier {
    /// Build a classifier for `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule table cannot be built for the nick.
    pub fn new(
        channel: impl Into<String>,
        settings: &ClassifierSettings,
    ) -> Result<Self, TriggerError> {
        let table = RuleTable::for_mode(settings.mode, &settings.nick)?;
        Ok(Self {
            channel: channel.into(),
            nick: settings.nick.clone(),
            bot_nicks: settings.bot_nicks.clone(),
            check_bot_nicks: settings.check_bot_nicks,
            silence_threshold: settings.silence_threshold,
            table,
        })
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.table.mode()
    }

    /// Classify a line, stamping the event with the current time.
    pub fn classify(&self, line: &str, state: &mut SessionState) -> Option<Event> {
        self.classify_at(line, state, Instant::now())
    }

    /// Classify a line observed at `now`.
    ///
    /// Rules are tried in table order; the first one that claims the line
    /// decides the result. Lines no rule claims leave `state` untouched.
    pub fn classify_at(
        &self,
        line: &str,
        state: &mut SessionState,
        now: Instant,
    ) -> Option<Event> {
        let view = LineView::parse(line);
        if view.body.is_empty() {
            return None;
        }

        for rule in self.table.rules() {
            let Some(caps) = rule.pattern().captures(&view.body) else {
                continue;
            };
            if !self.in_scope(rule, &view, &caps) {
                continue;
            }
            match self.apply(rule.kind(), &caps, &view, state, line) {
                Claim::Pass => {}
                Claim::Claimed(event) => {
                    tracing::trace!(
                        channel = %self.channel,
                        rule = rule.kind().as_str(),
                        "Line claimed"
                    );
                    state.last_seen_at = Some(now);
                    return event.map(|mut e| {
                        e.detected_at = now;
                        e
                    });
                }
            }
        }

        None
    }

    /// Report a silence gap as a disconnect.
    ///
    /// `silent_for` is how long the source has produced no lines. The caller
    /// is responsible for reporting each quiet spell only once.
    pub fn check_silence(&self, state: &mut SessionState, silent_for: Duration) -> Option<Event> {
        let threshold = self.silence_threshold?;
        if silent_for < threshold {
            return None;
        }
        state.mark_disruption();
        Some(
            Event::new(
                EventKind::Disconnected,
                &self.channel,
                format!("No log activity for {}s", silent_for.as_secs()),
            )
            .with_subject(&self.nick),
        )
    }

    fn in_scope(&self, rule: &TriggerRule, view: &LineView, caps: &Captures<'_>) -> bool {
        if !self.check_bot_nicks {
            return true;
        }
        match rule.scope() {
            RuleScope::Anyone => true,
            RuleScope::Status => view.is_status(),
            RuleScope::Bot => match caps.name("actor") {
                Some(actor) => self.is_bot(actor.as_str()),
                None => view.spoken_by_any(&self.bot_nicks),
            },
        }
    }

    fn is_bot(&self, nick: &str) -> bool {
        let nick = nick.trim_start_matches(['~', '&', '@', '%', '+']);
        self.bot_nicks.iter().any(|b| b.eq_ignore_ascii_case(nick))
    }

    fn is_me(&self, nick: &str) -> bool {
        nick.eq_ignore_ascii_case(&self.nick)
    }

    fn event(&self, kind: EventKind, line: &str) -> Event {
        Event::new(kind, &self.channel, line.trim_end_matches(['\r', '\n']))
    }

    fn apply(
        &self,
        kind: RuleKind,
        caps: &Captures<'_>,
        view: &LineView,
        state: &mut SessionState,
        line: &str,
    ) -> Claim {
        match kind {
            RuleKind::KickSelf => {
                let target = caps.name("target").map_or("", |m| m.as_str());
                if !self.is_me(target) {
                    return Claim::Pass;
                }
                let outcome = caps
                    .name("reason")
                    .and_then(|r| InterviewOutcome::from_kick_reason(r.as_str()));
                Claim::Claimed(Some(
                    self.event(EventKind::Kicked, line)
                        .with_subject(target)
                        .with_outcome(outcome),
                ))
            }
            RuleKind::DisconnectNotice => {
                state.mark_disruption();
                Claim::Claimed(Some(
                    self.event(EventKind::Disconnected, line)
                        .with_subject(&self.nick),
                ))
            }
            RuleKind::SelfQuit => {
                state.mark_disruption();
                Claim::Claimed(Some(
                    self.event(EventKind::Disconnected, line)
                        .with_subject(&self.nick),
                ))
            }
            RuleKind::NetsplitQuit => {
                state.mark_disruption();
                let nick = caps.name("nick").map_or("", |m| m.as_str());
                Claim::Claimed(Some(
                    self.event(EventKind::NetsplitDetected, line)
                        .with_subject(nick),
                ))
            }
            RuleKind::InterviewAnnounce => {
                let nick = caps
                    .name("nick")
                    .map_or("", |m| m.as_str())
                    .trim_end_matches(['.', ',', '!', ';']);
                if nick.is_empty() {
                    return Claim::Pass;
                }
                let queue = caps.name("queue").and_then(|q| q.as_str().parse().ok());
                state.current_interviewee = Some(nick.to_string());
                let kind = if self.is_me(nick) {
                    EventKind::YourInterview
                } else {
                    EventKind::InterviewStarted
                };
                Claim::Claimed(Some(
                    self.event(kind, line).with_subject(nick).with_queue(queue),
                ))
            }
            RuleKind::QueuePosition => {
                let Some(position) = caps
                    .name("position")
                    .and_then(|p| p.as_str().parse::<u32>().ok())
                else {
                    return Claim::Pass;
                };
                let disrupted = state.disruption_seen;
                let previous = state.update_queue_position(position);
                if disrupted && previous.is_some_and(|prev| position > prev) {
                    tracing::warn!(
                        channel = %self.channel,
                        previous = ?previous,
                        position,
                        "Queue position worsened after netsplit"
                    );
                    return Claim::Claimed(Some(
                        self.event(EventKind::NetsplitQueueLoss, line)
                            .with_subject(&self.nick)
                            .with_queue(Some(position)),
                    ));
                }
                Claim::Claimed(None)
            }
            RuleKind::Mention => {
                // `/me` actions have a speaker; other status lines do not.
                let speaker = match view.action_nick() {
                    Some(actor) => Some(actor),
                    None if view.is_status() && self.check_bot_nicks => return Claim::Pass,
                    None => view.speaker.as_deref(),
                };
                if speaker.is_some_and(|s| self.is_me(s)) {
                    return Claim::Pass;
                }
                let mut event = self.event(EventKind::Mention, line);
                if let Some(speaker) = speaker {
                    event = event.with_subject(speaker);
                }
                Claim::Claimed(Some(event))
            }
            RuleKind::KickOutcome => {
                let Some(outcome) = caps
                    .name("reason")
                    .and_then(|r| InterviewOutcome::from_kick_reason(r.as_str()))
                else {
                    return Claim::Pass;
                };
                let target = caps.name("target").map_or("", |m| m.as_str());
                Claim::Claimed(Some(
                    self.event(EventKind::OutcomeObserved(outcome), line)
                        .with_subject(target),
                ))
            }
        }
    }
}
