//! Player controller trait and match view
//!
//! The runner asks a controller which action to request and how to answer
//! the quiz question that gates it. Controllers only see a read-only
//! [`MatchView`]; every mutation goes through the engine.

use crate::core::{FieldSlot, PlayerRef, Side, Stance};
use crate::game::rules;
use crate::game::scoring::MatchOutcome;
use crate::game::state::MatchState;
use crate::game::ActionKind;
use crate::remote::Question;
use smallvec::SmallVec;

/// Read-only view of a match for controllers and renderers
pub struct MatchView<'a> {
    state: &'a MatchState,
}

impl<'a> MatchView<'a> {
    pub fn new(state: &'a MatchState) -> Self {
        MatchView { state }
    }

    /// The full state, for renderers
    pub fn state(&self) -> &'a MatchState {
        self.state
    }

    pub fn possession(&self) -> Side {
        self.state.possession
    }

    pub fn ball_holder(&self) -> PlayerRef {
        self.state.ball_holder
    }

    pub fn holder_slot(&self) -> FieldSlot {
        self.state.pitch.slot_of(self.state.ball_holder)
    }

    pub fn holder_stance(&self) -> Stance {
        self.state.holder_stance()
    }

    pub fn can_shoot(&self) -> bool {
        self.state.can_shoot
    }

    pub fn score(&self, side: Side) -> u32 {
        self.state.score(side)
    }

    pub fn action_count(&self) -> u32 {
        self.state.action_count()
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn message(&self) -> Option<&'a str> {
        self.state.message.as_deref()
    }

    /// Actions the engine would charge and act on right now
    ///
    /// Empty while the match is over or a transition is running. With the
    /// opponent on the ball only a tackle is offered.
    pub fn available_actions(&self) -> SmallVec<[ActionKind; 4]> {
        let mut actions = SmallVec::new();
        if self.is_over() || self.is_busy() {
            return actions;
        }
        if self.possession() == Side::Away {
            actions.push(ActionKind::Tackle);
            return actions;
        }

        let pitch = &self.state.pitch;
        let holder = self.ball_holder();
        if !rules::reachable_receivers(pitch, holder).is_empty() {
            actions.push(ActionKind::Pass);
        }
        if rules::dribble_move(pitch, holder).is_some() {
            actions.push(ActionKind::Dribble);
        }
        if self.can_shoot() {
            actions.push(ActionKind::Shoot);
        }
        actions
    }
}

/// Drives the home side of a match
///
/// Implement this to plug in an AI, a scripted test player or a terminal
/// prompt.
pub trait PlayerController {
    fn name(&self) -> &str;

    /// Pick one of `available`, or `None` to wait
    ///
    /// The runner may pass every non-tackle action when nothing is legal so
    /// the controller can burn a charged illegal action.
    fn choose_action(&mut self, view: &MatchView, available: &[ActionKind]) -> Option<ActionKind>;

    /// Index of the chosen answer in `question.choices`
    fn answer(&mut self, view: &MatchView, question: &Question) -> usize;

    /// Called once when the match ends
    fn on_match_end(&mut self, _view: &MatchView, _outcome: MatchOutcome) {}
}
