//! Dispatcher against a mock ntfy server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use interview_notify::notify::{DeliveryStatus, Dispatcher, HistoryLog, NtfyTransport};
use interview_notify::trigger::{Event, EventKind, InterviewOutcome};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(server: &MockServer, rate_limit: Duration) -> Dispatcher {
    let transport =
        NtfyTransport::new(&server.uri(), "interviews", Duration::from_secs(5)).unwrap();
    Dispatcher::new(Arc::new(transport), rate_limit, Duration::from_secs(5))
}

#[tokio::test]
async fn test_critical_events_bypass_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/interviews"))
        .and(header("Priority", "5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server, Duration::from_secs(3600));
    let event = Event::new(
        EventKind::YourInterview,
        "#red",
        "<Gatekeeper> Currently interviewing: alice",
    );
    let now = Instant::now();
    for _ in 0..3 {
        assert_eq!(
            dispatcher.dispatch_at(&event, now).await,
            Some(DeliveryStatus::Sent)
        );
    }
}

#[tokio::test]
async fn test_mentions_are_rate_limited_per_channel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Tags", "wave"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server, Duration::from_secs(60));
    let red = Event::new(EventKind::Mention, "#red", "<bob> alice: hi");
    let orp = Event::new(EventKind::Mention, "#orp", "<bob> alice: hi");
    let start = Instant::now();

    assert_eq!(
        dispatcher.dispatch_at(&red, start).await,
        Some(DeliveryStatus::Sent)
    );
    assert_eq!(
        dispatcher
            .dispatch_at(&red, start + Duration::from_secs(10))
            .await,
        Some(DeliveryStatus::Suppressed)
    );
    assert_eq!(
        dispatcher
            .dispatch_at(&orp, start + Duration::from_secs(10))
            .await,
        Some(DeliveryStatus::Sent)
    );
}

#[tokio::test]
async fn test_outcomes_are_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher(&server, Duration::from_secs(60));
    let event = Event::new(
        EventKind::OutcomeObserved(InterviewOutcome::Passed),
        "#red",
        "* Gatekeeper kicked bob from the channel (Congratulations! Welcome to RED.)",
    );
    assert!(dispatcher.dispatch(&event).await.is_none());
}

#[tokio::test]
async fn test_history_records_every_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("logs").join("notifications.log");
    let dispatcher =
        dispatcher(&server, Duration::from_secs(60)).with_history(HistoryLog::new(&log_path));

    let interview = Event::new(
        EventKind::InterviewStarted,
        "#red",
        "<Gatekeeper> Currently interviewing: bob",
    );
    let now = Instant::now();
    dispatcher.dispatch_at(&interview, now).await;
    dispatcher.dispatch_at(&interview, now).await;

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("channel=#red"));
    assert!(lines[0].contains("type=interview"));
    assert!(lines[0].contains("status=sent"));
    assert!(lines[0].contains(r#"title="Interview detected [#red]""#));
    assert!(lines[1].contains("status=suppressed"));
}

#[tokio::test]
async fn test_server_error_is_recorded_as_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("notifications.log");
    let dispatcher =
        dispatcher(&server, Duration::from_secs(60)).with_history(HistoryLog::new(&log_path));

    let event = Event::new(EventKind::Kicked, "#red", "* Gatekeeper kicked alice from the channel");
    assert_eq!(
        dispatcher.dispatch(&event).await,
        Some(DeliveryStatus::Failed)
    );

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("status=failed"));
    assert!(contents.contains("priority=5"));
}

#[tokio::test]
async fn test_slow_server_is_failed_not_blocking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport =
        NtfyTransport::new(&server.uri(), "interviews", Duration::from_secs(10)).unwrap();
    let dispatcher = Dispatcher::new(
        Arc::new(transport),
        Duration::from_secs(60),
        Duration::from_millis(200),
    );

    let event = Event::new(EventKind::Disconnected, "#red", "* Disconnected");
    let started = Instant::now();
    assert_eq!(
        dispatcher.dispatch(&event).await,
        Some(DeliveryStatus::Failed)
    );
    assert!(started.elapsed() < Duration::from_secs(3));
}
