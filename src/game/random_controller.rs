//! Random controller for simulations and baseline play
//!
//! Picks uniformly among the offered actions and answers questions
//! correctly with a fixed probability.

use crate::game::controller::{MatchView, PlayerController};
use crate::game::dice::{seeded, RandomSource};
use crate::game::ActionKind;
use crate::remote::Question;
use rand_chacha::ChaCha12Rng;

/// A controller that makes random choices
pub struct RandomController {
    name: String,
    accuracy: f64,
    rng: ChaCha12Rng,
}

impl RandomController {
    /// Seeded controller that answers correctly with probability `accuracy`
    pub fn new(seed: u64, accuracy: f64) -> Self {
        RandomController {
            name: format!("random({accuracy:.2})"),
            accuracy: accuracy.clamp(0.0, 1.0),
            rng: seeded(seed),
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }
}

impl PlayerController for RandomController {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(&mut self, _view: &MatchView, available: &[ActionKind]) -> Option<ActionKind> {
        if available.is_empty() {
            None
        } else {
            Some(available[self.rng.pick_index(available.len())])
        }
    }

    fn answer(&mut self, _view: &MatchView, question: &Question) -> usize {
        if self.rng.chance(self.accuracy) {
            return question.correct_index;
        }
        // Any of the three wrong answers
        let offset = 1 + self.rng.pick_index(question.choices.len() - 1);
        (question.correct_index + offset) % question.choices.len()
    }
}
