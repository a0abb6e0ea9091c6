//! Human action kinds and their outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four actions a player can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Pass,
    Dribble,
    Shoot,
    Tackle,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Pass,
        ActionKind::Dribble,
        ActionKind::Shoot,
        ActionKind::Tackle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Pass => "pass",
            ActionKind::Dribble => "dribble",
            ActionKind::Shoot => "shoot",
            ActionKind::Tackle => "tackle",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" | "p" => Ok(ActionKind::Pass),
            "dribble" | "d" => Ok(ActionKind::Dribble),
            "shoot" | "s" => Ok(ActionKind::Shoot),
            "tackle" | "t" => Ok(ActionKind::Tackle),
            _ => Err(format!(
                "invalid action '{s}' (expected: pass, dribble, shoot, tackle)"
            )),
        }
    }
}

/// Why an action request was turned away without being charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The match has ended
    MatchOver,
    /// A staged transition (shot, dribble, celebration, restart) is in flight
    Busy,
    /// The opponent holds the ball; only a tackle is accepted
    OpponentTurn,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MatchOver => write!(f, "match is over"),
            RejectReason::Busy => write!(f, "a transition is still in progress"),
            RejectReason::OpponentTurn => write!(f, "opponent has the ball"),
        }
    }
}

/// Result of a human action request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Not accepted; nothing changed and the action was not counted
    Rejected(RejectReason),
    /// Counted, but no transition exists from the current slot
    Illegal,
    /// Counted and resolved immediately
    Resolved { success: bool },
    /// Counted; the shot resolves after the suspense window
    ShotPending,
    /// Counted; reaching the action cap ended the match before any effect
    MatchEnded,
}

impl ActionOutcome {
    /// Did this request count toward the action limit?
    pub fn was_charged(&self) -> bool {
        !matches!(self, ActionOutcome::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_kind() {
        assert_eq!("pass".parse::<ActionKind>(), Ok(ActionKind::Pass));
        assert_eq!(" Shoot ".parse::<ActionKind>(), Ok(ActionKind::Shoot));
        assert_eq!("t".parse::<ActionKind>(), Ok(ActionKind::Tackle));
        assert!("volley".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_outcome_charging() {
        assert!(!ActionOutcome::Rejected(RejectReason::Busy).was_charged());
        assert!(ActionOutcome::Illegal.was_charged());
        assert!(ActionOutcome::ShotPending.was_charged());
        assert!(ActionOutcome::Resolved { success: false }.was_charged());
        assert!(ActionOutcome::MatchEnded.was_charged());
    }
}
