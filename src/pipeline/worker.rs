//! Per-channel worker: tail, classify, dispatch, record.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::analytics::AnalyticsHandle;
use crate::notify::Dispatcher;
use crate::trigger::{Event, SessionState, TriggerClassifier};
use crate::watcher::LineTailer;

/// Lower bound on how often the silence check runs.
const MIN_SILENCE_CHECK: Duration = Duration::from_secs(1);

/// Counters reported when a worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub lines: u64,
    pub events: u64,
}

/// Classifier, session state and downstream handles for one channel.
struct EventSink {
    classifier: TriggerClassifier,
    state: SessionState,
    dispatcher: Arc<Dispatcher>,
    analytics: Option<AnalyticsHandle>,
    stats: WorkerStats,
}

impl EventSink {
    async fn line(&mut self, line: &str) -> Option<Event> {
        self.stats.lines += 1;
        let event = self.classifier.classify(line, &mut self.state)?;
        self.event(&event).await;
        Some(event)
    }

    async fn event(&mut self, event: &Event) {
        self.stats.events += 1;
        tracing::info!(
            channel = %event.channel,
            kind = %event.kind,
            subject = event.subject.as_deref().unwrap_or(""),
            "Event detected"
        );
        if let Some(analytics) = &self.analytics {
            analytics.record(event);
        }
        self.dispatcher.dispatch(event).await;
    }
}

/// Owns one channel's tailer, classifier and session state.
///
/// Lines are handled strictly in file order. Nothing here is shared with
/// other channels except the dispatcher and the analytics queue.
pub struct ChannelWorker {
    sink: EventSink,
    tailer: LineTailer,
    poll_interval: Duration,
}

impl ChannelWorker {
    #[must_use]
    pub fn new(
        classifier: TriggerClassifier,
        tailer: LineTailer,
        dispatcher: Arc<Dispatcher>,
        analytics: Option<AnalyticsHandle>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            sink: EventSink {
                classifier,
                state: SessionState::new(),
                dispatcher,
                analytics,
                stats: WorkerStats::default(),
            },
            tailer,
            poll_interval,
        }
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        self.sink.classifier.channel()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.sink.state
    }

    #[must_use]
    pub fn stats(&self) -> WorkerStats {
        self.sink.stats
    }

    /// Classify one line and act on the resulting event.
    pub async fn handle_line(&mut self, line: &str) -> Option<Event> {
        self.sink.line(line).await
    }

    /// Run until `cancel` fires.
    ///
    /// The current poll cycle and any in-flight dispatch finish before
    /// returning.
    pub async fn run(self, cancel: CancellationToken) -> WorkerStats {
        let Self {
            mut sink,
            tailer,
            poll_interval,
        } = self;
        tracing::info!(
            channel = %sink.classifier.channel(),
            dir = %tailer.dir().display(),
            mode = %sink.classifier.mode(),
            "Watching channel"
        );

        let lines = tailer.into_stream(poll_interval);
        tokio::pin!(lines);

        let mut silence_check = tokio::time::interval(poll_interval.max(MIN_SILENCE_CHECK));
        silence_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_activity: Option<Instant> = None;
        let mut silence_reported = false;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                line = lines.next() => {
                    let Some(line) = line else {
                        break;
                    };
                    last_activity = Some(Instant::now());
                    silence_reported = false;
                    sink.line(&line).await;
                }
                _ = silence_check.tick() => {
                    // Only a source that has produced lines can go silent.
                    let Some(last) = last_activity else {
                        continue;
                    };
                    if silence_reported {
                        continue;
                    }
                    if let Some(event) = sink.classifier.check_silence(&mut sink.state, last.elapsed()) {
                        tracing::warn!(channel = %event.channel, "Log has gone silent");
                        silence_reported = true;
                        sink.event(&event).await;
                    }
                }
            }
        }

        tracing::info!(
            channel = %sink.classifier.channel(),
            lines = sink.stats.lines,
            events = sink.stats.events,
            "Channel worker stopped"
        );
        sink.stats
    }
}
