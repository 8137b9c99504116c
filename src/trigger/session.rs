//! Per-channel session state.

use std::time::Instant;

/// Mutable state the classifier keeps for one channel.
///
/// Owned by the worker of that channel and only mutated through the
/// classifier, so no locking is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Last nick announced as being interviewed.
    pub current_interviewee: Option<String>,
    /// Last queue position announced for the configured nick.
    pub last_queue_position: Option<u32>,
    /// When the last matched line was processed.
    pub last_seen_at: Option<Instant>,
    /// A netsplit, disconnect or silence gap was seen since the last
    /// queue position update.
    pub disruption_seen: bool,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a mass-disconnect signature.
    pub fn mark_disruption(&mut self) {
        if !self.disruption_seen {
            tracing::debug!("Disruption signature recorded");
        }
        self.disruption_seen = true;
    }

    /// Store a new queue position, returning the previous one.
    ///
    /// Clears the disruption flag: the next regression needs a fresh signature.
    pub fn update_queue_position(&mut self, position: u32) -> Option<u32> {
        self.disruption_seen = false;
        self.last_queue_position.replace(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = SessionState::new();
        assert!(state.current_interviewee.is_none());
        assert!(state.last_queue_position.is_none());
        assert!(state.last_seen_at.is_none());
        assert!(!state.disruption_seen);
    }

    #[test]
    fn test_update_queue_position_clears_disruption() {
        let mut state = SessionState::new();
        state.mark_disruption();
        assert_eq!(state.update_queue_position(5), None);
        assert!(!state.disruption_seen);
        assert_eq!(state.update_queue_position(4), Some(5));
    }

    #[test]
    fn test_mark_disruption_is_idempotent() {
        let mut state = SessionState::new();
        state.mark_disruption();
        state.mark_disruption();
        assert!(state.disruption_seen);
    }
}
