//! Trigger module tests.

mod orp_test;
mod transcript_test;

/// Verify all public trigger types are exported from the library.
#[test]
fn test_all_trigger_types_exported() {
    use interview_notify::trigger::{
        ClassifierSettings, Event, EventKind, InterviewOutcome, LineView, Mode, RuleKind,
        RuleScope, RuleTable, SessionState, TriggerClassifier, TriggerError, TriggerRule,
    };

    let table = RuleTable::for_mode(Mode::Red, "alice").unwrap();
    assert!(!table.is_empty());
    let _: &[TriggerRule] = table.rules();
    let _ = RuleKind::Mention;
    let _ = RuleScope::Anyone;
    let _ = LineView::parse("<bob> hi");
    let _ = SessionState::new();
    let _ = Event::new(EventKind::Mention, "#red", "line");
    let _ = InterviewOutcome::Passed;
    let _: fn() -> TriggerError = || TriggerError::EmptyNick;

    let settings = ClassifierSettings {
        nick: "alice".to_string(),
        bot_nicks: vec!["Gatekeeper".to_string()],
        check_bot_nicks: true,
        mode: Mode::Orp,
        silence_threshold: None,
    };
    let classifier = TriggerClassifier::new("#orp", &settings).unwrap();
    assert_eq!(classifier.mode(), Mode::Orp);
}
