//! Scoring and match lifecycle
//!
//! Two states: in progress and over. The over-check runs only after a human
//! action is counted and after a goal, never after opponent-only moves.
//! Score limit is checked before the action cap, home before away.

use crate::core::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a match ended; fixed once set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverReason {
    MaxScore { side: Side, max_score: u32 },
    MaxActions { limit: u32 },
}

impl fmt::Display for OverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverReason::MaxScore { side, max_score } => {
                let team = match side {
                    Side::Home => "Blue",
                    Side::Away => "Red",
                };
                write!(f, "{team} team reached max score ({max_score})")
            }
            OverReason::MaxActions { limit } => {
                write!(f, "Reached max player actions ({limit})")
            }
        }
    }
}

/// Final standing of a finished (or abandoned) match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Winner(Side),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringController {
    home: u32,
    away: u32,
    action_count: u32,
    max_score: Option<u32>,
    max_actions: u32,
    over: Option<OverReason>,
}

impl ScoringController {
    pub fn new(max_score: Option<u32>, max_actions: u32) -> Self {
        ScoringController {
            home: 0,
            away: 0,
            action_count: 0,
            max_score,
            max_actions,
            over: None,
        }
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    pub fn action_count(&self) -> u32 {
        self.action_count
    }

    pub fn max_score(&self) -> Option<u32> {
        self.max_score
    }

    pub fn max_actions(&self) -> u32 {
        self.max_actions
    }

    pub fn is_over(&self) -> bool {
        self.over.is_some()
    }

    pub fn over_reason(&self) -> Option<OverReason> {
        self.over
    }

    /// Count one human action; returns the reason if this ended the match
    pub fn record_action(&mut self) -> Option<OverReason> {
        if self.is_over() {
            return None;
        }
        self.action_count += 1;
        self.check_over()
    }

    /// Credit a goal; returns the reason if this ended the match
    pub fn record_goal(&mut self, side: Side) -> Option<OverReason> {
        if self.is_over() {
            return None;
        }
        match side {
            Side::Home => self.home += 1,
            Side::Away => self.away += 1,
        }
        self.check_over()
    }

    fn check_over(&mut self) -> Option<OverReason> {
        if self.over.is_some() {
            return None;
        }
        let reason = self
            .max_score
            .and_then(|max_score| {
                Side::BOTH
                    .into_iter()
                    .find(|&side| self.score(side) >= max_score)
                    .map(|side| OverReason::MaxScore { side, max_score })
            })
            .or_else(|| {
                (self.action_count >= self.max_actions).then_some(OverReason::MaxActions {
                    limit: self.max_actions,
                })
            });
        self.over = reason;
        reason
    }

    pub fn outcome(&self) -> MatchOutcome {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => MatchOutcome::Winner(Side::Home),
            std::cmp::Ordering::Less => MatchOutcome::Winner(Side::Away),
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_score_ends_match() {
        let mut scoring = ScoringController::new(Some(3), 100);
        assert_eq!(scoring.record_goal(Side::Away), None);
        assert_eq!(scoring.record_goal(Side::Away), None);
        let reason = scoring.record_goal(Side::Away).unwrap();
        assert_eq!(reason.to_string(), "Red team reached max score (3)");
        assert!(scoring.is_over());
        assert_eq!(scoring.outcome(), MatchOutcome::Winner(Side::Away));

        // frozen once over
        assert_eq!(scoring.record_goal(Side::Home), None);
        assert_eq!(scoring.score(Side::Home), 0);
        assert_eq!(scoring.record_action(), None);
        assert_eq!(scoring.action_count(), 0);
    }

    #[test]
    fn test_action_cap() {
        let mut scoring = ScoringController::new(None, 3);
        scoring.record_action();
        scoring.record_action();
        let reason = scoring.record_action().unwrap();
        assert_eq!(reason, OverReason::MaxActions { limit: 3 });
        assert_eq!(reason.to_string(), "Reached max player actions (3)");
        assert_eq!(scoring.outcome(), MatchOutcome::Draw);
    }

    #[test]
    fn test_score_checked_before_cap() {
        let mut scoring = ScoringController::new(Some(1), 1);
        scoring.home = 1;
        let reason = scoring.record_action().unwrap();
        assert_eq!(reason.to_string(), "Blue team reached max score (1)");
    }
}
