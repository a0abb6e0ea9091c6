//! Action success probabilities and the question-result modifier

use crate::core::{FieldSlot, Side};
use crate::game::rules::{shot_range, ShotRange};
use crate::game::ActionKind;
use crate::{QuizballError, Result};
use serde::{Deserialize, Serialize};

/// Base success probability per action
///
/// Shared by both sides; adjustable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionProbabilities {
    pub pass: f64,
    pub dribble: f64,
    pub shoot: f64,
    pub tackle: f64,
}

impl Default for ActionProbabilities {
    fn default() -> Self {
        ActionProbabilities {
            pass: 0.75,
            dribble: 0.55,
            shoot: 0.50,
            tackle: 0.60,
        }
    }
}

impl ActionProbabilities {
    pub fn get(&self, kind: ActionKind) -> f64 {
        match kind {
            ActionKind::Pass => self.pass,
            ActionKind::Dribble => self.dribble,
            ActionKind::Shoot => self.shoot,
            ActionKind::Tackle => self.tackle,
        }
    }

    /// Replace the base probability of one action
    pub fn set(&mut self, kind: ActionKind, probability: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(QuizballError::InvalidConfig(format!(
                "probability for {kind} must be within 0.0..=1.0, got {probability}"
            )));
        }
        let slot = match kind {
            ActionKind::Pass => &mut self.pass,
            ActionKind::Dribble => &mut self.dribble,
            ActionKind::Shoot => &mut self.shoot,
            ActionKind::Tackle => &mut self.tackle,
        };
        *slot = probability;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let mut copy = *self;
        for kind in ActionKind::ALL {
            copy.set(kind, self.get(kind))?;
        }
        Ok(())
    }
}

/// Additive adjustment applied after a quiz answer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuestionModifier {
    pub correct_bonus: f64,
    pub wrong_penalty: f64,
}

impl Default for QuestionModifier {
    fn default() -> Self {
        QuestionModifier {
            correct_bonus: 0.15,
            wrong_penalty: 0.25,
        }
    }
}

impl QuestionModifier {
    /// `clamp(base ± modifier, 0, 1)`; never accumulates across actions
    pub fn adjust(&self, base: f64, question_correct: bool) -> f64 {
        let adjusted = if question_correct {
            base + self.correct_bonus
        } else {
            base - self.wrong_penalty
        };
        adjusted.clamp(0.0, 1.0)
    }
}

/// On-target probability of a shot from `slot`
///
/// Distance shots use the fixed `distance` probability; shots from behind
/// the beaten defender use the current base shoot probability unmodified.
pub fn shot_on_target(side: Side, slot: FieldSlot, base_shoot: f64, distance: f64) -> f64 {
    match shot_range(side, slot) {
        ShotRange::PastDefender => base_shoot,
        ShotRange::Distance => distance,
    }
}
