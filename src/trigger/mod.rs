//! Trigger classification for IRC transcript lines.
//!
//! Maps raw lines to semantic events using per-mode rule tables and a small
//! amount of per-channel session state.

mod classifier;
mod error;
mod event;
mod line;
mod rules;
mod session;

pub use classifier::{ClassifierSettings, TriggerClassifier};
pub use error::TriggerError;
pub use event::{Event, EventKind, InterviewOutcome};
pub use line::LineView;
pub use rules::{Mode, RuleKind, RuleScope, RuleTable, TriggerRule};
pub use session::SessionState;
