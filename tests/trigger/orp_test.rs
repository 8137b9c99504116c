//! Orp phrasing.

use interview_notify::trigger::{
    ClassifierSettings, EventKind, InterviewOutcome, Mode, SessionState, TriggerClassifier,
};

fn settings(nick: &str, mode: Mode) -> ClassifierSettings {
    ClassifierSettings {
        nick: nick.to_string(),
        bot_nicks: vec!["Gatekeeper".to_string(), "Sentinel".to_string()],
        check_bot_nicks: true,
        mode,
        silence_threshold: None,
    }
}

fn orp(nick: &str) -> TriggerClassifier {
    TriggerClassifier::new("#orp-invites", &settings(nick, Mode::Orp)).unwrap()
}

#[test]
fn test_mode_parses_case_insensitively() {
    assert_eq!("ORP".parse::<Mode>().unwrap(), Mode::Orp);
    assert_eq!("red".parse::<Mode>().unwrap(), Mode::Red);
    assert!("ops".parse::<Mode>().is_err());
}

#[test]
fn test_now_interviewing_with_queue_count() {
    let c = orp("alice");
    let mut state = SessionState::new();
    let event = c
        .classify(
            "[14:00] <Sentinel> Now interviewing bob, 7 people waiting in the queue",
            &mut state,
        )
        .unwrap();
    assert_eq!(event.kind, EventKind::InterviewStarted);
    assert_eq!(event.subject.as_deref(), Some("bob"));
    assert_eq!(event.queue, Some(7));
    assert_eq!(state.current_interviewee.as_deref(), Some("bob"));
}

#[test]
fn test_currently_interviewing_self() {
    let c = orp("alice");
    let mut state = SessionState::new();
    let event = c
        .classify("<Gatekeeper> Currently interviewing: Alice", &mut state)
        .unwrap();
    assert_eq!(event.kind, EventKind::YourInterview);
    assert!(event.critical());
}

#[test]
fn test_queue_position_phrasings() {
    let c = orp("alice");
    let mut state = SessionState::new();

    assert!(c
        .classify("<Gatekeeper> Queue position for alice is #3", &mut state)
        .is_none());
    assert_eq!(state.last_queue_position, Some(3));

    assert!(c
        .classify("<Gatekeeper> alice, your position is 2", &mut state)
        .is_none());
    assert_eq!(state.last_queue_position, Some(2));
}

#[test]
fn test_queue_loss_after_netsplit() {
    let c = orp("alice");
    let mut state = SessionState::new();
    c.classify("<Gatekeeper> alice: your position is 3", &mut state);
    let split = c
        .classify("* carol (~c@host) has quit (*.net *.split)", &mut state)
        .unwrap();
    assert_eq!(split.kind, EventKind::NetsplitDetected);

    let loss = c
        .classify("<Gatekeeper> Queue position for alice is #15", &mut state)
        .unwrap();
    assert_eq!(loss.kind, EventKind::NetsplitQueueLoss);
    assert_eq!(loss.queue, Some(15));
}

#[test]
fn test_kicked_from_by_bot_reports_outcome() {
    let c = orp("alice");
    let mut state = SessionState::new();
    let event = c
        .classify(
            "bob was kicked from #orp-interview by Gatekeeper (Congratulations! Welcome to ORP.)",
            &mut state,
        )
        .unwrap();
    assert_eq!(
        event.kind,
        EventKind::OutcomeObserved(InterviewOutcome::Passed)
    );
    assert_eq!(event.outcome, Some(InterviewOutcome::Passed));
}

#[test]
fn test_red_queue_phrasing_is_only_a_mention_in_orp() {
    let c = orp("alice");
    let mut state = SessionState::new();
    let event = c
        .classify("<Gatekeeper> alice: you are number 5 in the queue", &mut state)
        .unwrap();
    assert_eq!(event.kind, EventKind::Mention);
    assert!(state.last_queue_position.is_none());
}

#[test]
fn test_orp_announcement_ignored_in_red() {
    let red = TriggerClassifier::new("#red", &settings("alice", Mode::Red)).unwrap();
    let mut state = SessionState::new();
    assert!(red
        .classify("<Gatekeeper> Now interviewing bob", &mut state)
        .is_none());
}

#[test]
fn test_nick_with_regex_metacharacters() {
    let c = orp("[alice]");
    let mut state = SessionState::new();

    assert!(c
        .classify("<Gatekeeper> Queue position for [alice] is 2", &mut state)
        .is_none());
    assert_eq!(state.last_queue_position, Some(2));

    let mention = c.classify("<bob> ping [alice] please", &mut state).unwrap();
    assert_eq!(mention.kind, EventKind::Mention);

    assert!(c.classify("<bob> alice is not you", &mut state).is_none());
}
