//! Scripted controller for tests and demos
//!
//! Follows a fixed list of `(action, answer correctly?)` steps.

use crate::game::controller::{MatchView, PlayerController};
use crate::game::ActionKind;
use crate::remote::Question;
use std::collections::VecDeque;

/// A controller that follows a predetermined sequence of actions
pub struct ScriptedController {
    steps: VecDeque<(ActionKind, bool)>,
    /// Correctness of the step whose question is about to be answered
    answer_next: bool,
}

impl ScriptedController {
    pub fn new(steps: impl IntoIterator<Item = (ActionKind, bool)>) -> Self {
        ScriptedController {
            steps: steps.into_iter().collect(),
            answer_next: true,
        }
    }

    /// Steps not yet taken
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl PlayerController for ScriptedController {
    fn name(&self) -> &str {
        "scripted"
    }

    /// Ignores `available`; a scripted step may be illegal on purpose
    fn choose_action(&mut self, _view: &MatchView, _available: &[ActionKind]) -> Option<ActionKind> {
        let (kind, correct) = self.steps.pop_front()?;
        self.answer_next = correct;
        Some(kind)
    }

    fn answer(&mut self, _view: &MatchView, question: &Question) -> usize {
        if self.answer_next {
            question.correct_index
        } else {
            (question.correct_index + 1) % question.choices.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::game::scoring::ScoringController;
    use crate::game::state::MatchState;

    #[test]
    fn test_scripted_controller() {
        let state =
            MatchState::kickoff(Role::Midfielder1, ScoringController::new(None, 10), "s".into(), 10);
        let view = MatchView::new(&state);
        let question = Question::fallback();
        let mut controller =
            ScriptedController::new([(ActionKind::Pass, true), (ActionKind::Shoot, false)]);

        assert_eq!(controller.choose_action(&view, &[]), Some(ActionKind::Pass));
        assert!(question.is_correct(controller.answer(&view, &question)));

        assert_eq!(controller.choose_action(&view, &[]), Some(ActionKind::Shoot));
        assert!(!question.is_correct(controller.answer(&view, &question)));

        assert_eq!(controller.choose_action(&view, &[]), None);
        assert_eq!(controller.remaining(), 0);
    }
}
