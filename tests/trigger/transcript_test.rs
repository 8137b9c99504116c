//! Full transcript scenarios for the red rule table.

use interview_notify::trigger::{
    ClassifierSettings, EventKind, InterviewOutcome, Mode, SessionState, TriggerClassifier,
};

fn classifier(nick: &str, check_bot_nicks: bool) -> TriggerClassifier {
    let settings = ClassifierSettings {
        nick: nick.to_string(),
        bot_nicks: vec!["Gatekeeper".to_string()],
        check_bot_nicks,
        mode: Mode::Red,
        silence_threshold: None,
    };
    TriggerClassifier::new("#red-invites", &settings).unwrap()
}

/// Run a transcript and collect the kinds of all events produced.
fn run(classifier: &TriggerClassifier, lines: &[&str]) -> (Vec<EventKind>, SessionState) {
    let mut state = SessionState::new();
    let kinds = lines
        .iter()
        .filter_map(|line| classifier.classify(line, &mut state))
        .map(|e| e.kind)
        .collect();
    (kinds, state)
}

#[test]
fn test_waiting_in_queue_until_called() {
    let c = classifier("alice", true);
    let (kinds, state) = run(
        &c,
        &[
            "[09:00:00] * Now talking in #red-invites",
            "[09:00:05] <Gatekeeper> Currently interviewing: bob ::: #red-interview-01 ::: 12 remaining in queue.",
            "[09:01:00] <carol> anyone know how long this takes?",
            "[09:02:00] <Gatekeeper> alice: you are number 11 in the queue",
            "[09:05:00] * Gatekeeper kicked bob from the channel (Congratulations! Welcome to RED.)",
            "[09:06:00] <dave> alice are you still here?",
            "[09:10:00] <Gatekeeper> Currently interviewing: alice ::: #red-interview-02 ::: 10 remaining in queue.",
        ],
    );

    assert_eq!(
        kinds,
        vec![
            EventKind::InterviewStarted,
            EventKind::OutcomeObserved(InterviewOutcome::Passed),
            EventKind::Mention,
            EventKind::YourInterview,
        ]
    );
    assert_eq!(state.current_interviewee.as_deref(), Some("alice"));
    assert_eq!(state.last_queue_position, Some(11));
}

#[test]
fn test_netsplit_then_worse_position_is_queue_loss() {
    let c = classifier("alice", true);
    let mut state = SessionState::new();

    assert!(c
        .classify("<Gatekeeper> alice: you are number 4 in the queue", &mut state)
        .is_none());

    let split = c
        .classify(
            "[10:00] * erin (~erin@host) has quit (*.net *.split)",
            &mut state,
        )
        .unwrap();
    assert_eq!(split.kind, EventKind::NetsplitDetected);
    assert_eq!(split.subject.as_deref(), Some("erin"));

    let loss = c
        .classify("<Gatekeeper> alice: you are number 9 in the queue", &mut state)
        .unwrap();
    assert_eq!(loss.kind, EventKind::NetsplitQueueLoss);
    assert_eq!(loss.queue, Some(9));
    assert!(!loss.critical());

    // Further movement without a new split is ordinary progression.
    assert!(c
        .classify("<Gatekeeper> alice: you are number 12 in the queue", &mut state)
        .is_none());
}

#[test]
fn test_worse_position_without_split_is_silent() {
    let c = classifier("alice", true);
    let (kinds, state) = run(
        &c,
        &[
            "<Gatekeeper> alice: you are number 4 in the queue",
            "<Gatekeeper> alice: you are number 6 in the queue",
        ],
    );
    assert!(kinds.is_empty());
    assert_eq!(state.last_queue_position, Some(6));
}

#[test]
fn test_better_position_after_split_is_not_loss() {
    let c = classifier("alice", true);
    let (kinds, _) = run(
        &c,
        &[
            "<Gatekeeper> alice: you are number 8 in the queue",
            "* frank has quit (Ping timeout: 121 seconds)",
            "<Gatekeeper> alice: you are number 7 in the queue",
        ],
    );
    assert_eq!(kinds, vec![EventKind::NetsplitDetected]);
}

#[test]
fn test_own_quit_is_disconnect_not_netsplit() {
    let c = classifier("alice", true);
    let (kinds, state) = run(&c, &["* alice (~a@host) has quit (*.net *.split)"]);
    assert_eq!(kinds, vec![EventKind::Disconnected]);
    assert!(state.disruption_seen);
}

#[test]
fn test_kick_of_self_is_critical_and_carries_outcome() {
    let c = classifier("alice", true);
    let mut state = SessionState::new();
    let event = c
        .classify(
            "* Gatekeeper kicked alice from the channel (Sorry, you have not passed the interview.)",
            &mut state,
        )
        .unwrap();
    assert_eq!(event.kind, EventKind::Kicked);
    assert!(event.critical());
    assert_eq!(event.outcome, Some(InterviewOutcome::Failed));
}

#[test]
fn test_kick_by_non_bot_ignored_when_filtering() {
    let c = classifier("alice", true);
    let (kinds, _) = run(
        &c,
        &["* mallory kicked bob from the channel (You have missed your interview)"],
    );
    assert!(kinds.is_empty());

    let lenient = classifier("alice", false);
    let (kinds, _) = run(
        &lenient,
        &["* mallory kicked bob from the channel (You have missed your interview)"],
    );
    assert_eq!(
        kinds,
        vec![EventKind::OutcomeObserved(InterviewOutcome::Missed)]
    );
}

#[test]
fn test_impersonated_announcement_ignored_when_filtering() {
    let c = classifier("alice", true);
    let (kinds, state) = run(&c, &["<mallory> Currently interviewing: alice"]);
    // Still a mention, never a critical interview call.
    assert_eq!(kinds, vec![EventKind::Mention]);
    assert!(state.current_interviewee.is_none());
}

#[test]
fn test_unmatched_lines_leave_state_untouched() {
    let c = classifier("alice", true);
    let mut state = SessionState::new();
    state.current_interviewee = Some("bob".to_string());
    state.last_queue_position = Some(3);
    let before = state.clone();

    for line in [
        "",
        "   ",
        "[12:00] <carol> lunch?",
        "[12:00] * dave has joined #red-invites",
        "garbage \u{0}\u{1} bytes",
        "<Gatekeeper> Welcome! Please wait for your turn.",
    ] {
        assert!(c.classify(line, &mut state).is_none(), "{line:?}");
    }
    assert_eq!(state, before);
}

#[test]
fn test_html_transcript() {
    let c = classifier("alice", true);
    let (kinds, _) = run(
        &c,
        &[r#"<div><span class="ts">[09:10]</span> <span class="nick">&lt;Gatekeeper&gt;</span> Currently interviewing: alice</div>"#],
    );
    assert_eq!(kinds, vec![EventKind::YourInterview]);
}

#[test]
fn test_actions_mention_but_status_lines_do_not() {
    let c = classifier("alice", true);
    let (kinds, _) = run(
        &c,
        &[
            "[10:00] * bob pokes alice",
            "[10:01] * Gatekeeper gives voice to alice",
            "[10:02] * alice stretches",
            "[10:03] * carol waves",
        ],
    );
    assert_eq!(kinds, vec![EventKind::Mention]);
}
