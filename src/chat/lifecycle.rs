//! Session status transitions driven by chat turns.
//!
//! Only one transition happens here: a turn that produced drafts moves the
//! session to `Drafting`. This is applied whatever the current status is, so a
//! `Refining` or `Complete` session drops back to `Drafting` when new drafts
//! arrive. `Refining` and `Complete` are set elsewhere.

use crate::models::SessionStatus;

/// The status a session should be set to after a turn that produced
/// `drafts_produced` drafts, or `None` if it stays as it is.
pub fn status_after_turn(drafts_produced: usize) -> Option<SessionStatus> {
    (drafts_produced > 0).then_some(SessionStatus::Drafting)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_drafts_leaves_status_alone() {
        assert_eq!(status_after_turn(0), None);
    }

    #[test]
    fn any_drafts_force_drafting() {
        assert_eq!(status_after_turn(1), Some(SessionStatus::Drafting));
        assert_eq!(status_after_turn(3), Some(SessionStatus::Drafting));
    }
}
