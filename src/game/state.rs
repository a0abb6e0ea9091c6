//! Match state: the single mutable model of one match

use crate::core::{Pitch, PlayerRef, Role, Side, Stance};
use crate::game::rules;
use crate::game::scoring::{OverReason, ScoringController};
use serde::{Deserialize, Serialize};

/// Staged transition currently in flight
///
/// While one is set, human actions are rejected as busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Between the dribble swap and the stance settle
    Dribbling,
    /// "Shooting..." suspense before the shot is rolled
    Shooting,
    /// Keeper holding a saved shot
    SaveRestart,
    Celebrating,
    /// A keeper holds the ball and is about to distribute it
    KeeperRestart,
}

/// Complete state of one match
///
/// Created at kickoff and discarded when the next match starts. Only the
/// possession engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    /// Both rosters
    pub pitch: Pitch,

    /// Side whose player holds the ball
    pub possession: Side,

    /// The unique player holding the ball
    pub ball_holder: PlayerRef,

    /// Pure function of `(possession, holder slot)`
    pub can_shoot: bool,

    /// Holder's side has beaten the opposing defensive line
    pub past_defender: bool,

    pub scoring: ScoringController,

    /// An opponent decision is queued
    pub opponent_turn_pending: bool,

    pub transition: Option<Transition>,

    /// Transient banner text
    pub message: Option<String>,

    pub session_id: String,

    /// Action count suggested by the session (informational unless enforced)
    pub max_actions_hint: u32,

    /// Identity of the current message, for delayed clears
    pub message_id: u64,

    /// Identity of the current opponent decision window
    pub turn_token: u64,
}

impl MatchState {
    /// Kickoff state: home midfielder `starter` holds the ball in passing stance
    pub fn kickoff(
        starter: Role,
        scoring: ScoringController,
        session_id: String,
        max_actions_hint: u32,
    ) -> Self {
        let holder = PlayerRef::new(Side::Home, starter);
        let mut pitch = Pitch::new();
        pitch.give_ball(holder, Stance::Passing);

        let mut state = MatchState {
            pitch,
            possession: Side::Home,
            ball_holder: holder,
            can_shoot: false,
            past_defender: false,
            scoring,
            opponent_turn_pending: false,
            transition: None,
            message: None,
            session_id,
            max_actions_hint,
            message_id: 0,
            turn_token: 0,
        };
        state.refresh_can_shoot();
        state
    }

    /// Record a new holder; flags on the pitch are set by the caller
    pub fn set_holder(&mut self, holder: PlayerRef) {
        self.ball_holder = holder;
        self.possession = holder.side;
        self.refresh_can_shoot();
    }

    pub fn refresh_can_shoot(&mut self) {
        let slot = self.pitch.slot_of(self.ball_holder);
        self.can_shoot = rules::can_shoot(self.possession, slot);
    }

    pub fn holder_stance(&self) -> Stance {
        self.pitch.player(self.ball_holder).stance
    }

    pub fn is_over(&self) -> bool {
        self.scoring.is_over()
    }

    pub fn over_reason(&self) -> Option<OverReason> {
        self.scoring.over_reason()
    }

    pub fn is_shooting(&self) -> bool {
        self.transition == Some(Transition::Shooting)
    }

    pub fn is_busy(&self) -> bool {
        self.transition.is_some()
    }

    pub fn score(&self, side: Side) -> u32 {
        self.scoring.score(side)
    }

    pub fn action_count(&self) -> u32 {
        self.scoring.action_count()
    }

    /// First violated consistency rule, if any
    pub fn consistency_error(&self) -> Option<String> {
        let holders = self.pitch.ball_holders();
        if holders.len() != 1 {
            return Some(format!("{} players flagged with the ball", holders.len()));
        }
        if holders[0] != self.ball_holder {
            return Some(format!(
                "ball flag on {} but holder recorded as {}",
                holders[0], self.ball_holder
            ));
        }
        if self.possession != self.ball_holder.side {
            return Some(format!(
                "possession {} disagrees with holder {}",
                self.possession, self.ball_holder
            ));
        }
        let slot = self.pitch.slot_of(self.ball_holder);
        if self.can_shoot != rules::can_shoot(self.possession, slot) {
            return Some(format!("stale can_shoot at slot {slot}"));
        }
        if !self.pitch.slots_are_distinct() {
            return Some("two players share a slot".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kickoff() -> MatchState {
        MatchState::kickoff(
            Role::Midfielder2,
            ScoringController::new(Some(5), 100),
            "test".to_string(),
            75,
        )
    }

    #[test]
    fn test_kickoff_state() {
        let state = kickoff();
        assert_eq!(state.possession, Side::Home);
        assert_eq!(state.ball_holder, PlayerRef::new(Side::Home, Role::Midfielder2));
        assert_eq!(state.holder_stance(), Stance::Passing);
        assert!(!state.can_shoot);
        assert!(!state.is_busy());
        assert_eq!(state.consistency_error(), None);
    }

    #[test]
    fn test_consistency_detects_second_ball() {
        let mut state = kickoff();
        state
            .pitch
            .player_mut(PlayerRef::new(Side::Away, Role::Attacker))
            .has_ball = true;
        assert!(state.consistency_error().is_some());
    }

    #[test]
    fn test_set_holder_recomputes_can_shoot() {
        let mut state = kickoff();
        let att = PlayerRef::new(Side::Home, Role::Attacker);
        state.pitch.give_ball(att, Stance::Passing);
        state.set_holder(att);
        assert!(state.can_shoot);
        assert_eq!(state.consistency_error(), None);
    }
}
