//! Player representation

use crate::core::{FieldSlot, Role, Side, Stance};
use serde::{Deserialize, Serialize};

/// One of the five players of a roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Fixed role within the roster
    pub role: Role,

    /// Current lane position
    pub slot: FieldSlot,

    /// Current posture
    pub stance: Stance,

    /// Is this player holding the ball?
    pub has_ball: bool,
}

impl Player {
    /// Create a player at its kickoff slot
    pub fn kickoff(side: Side, role: Role) -> Self {
        Player {
            role,
            slot: FieldSlot::kickoff(side, role),
            stance: Self::resting_stance(role),
            has_ball: false,
        }
    }

    /// Stance a player without the ball falls back to
    pub fn resting_stance(role: Role) -> Stance {
        match role {
            Role::Defender => Stance::Defending,
            _ => Stance::Standing,
        }
    }

    pub fn take_ball(&mut self, stance: Stance) {
        self.has_ball = true;
        self.stance = stance;
    }

    pub fn rest(&mut self) {
        self.stance = Self::resting_stance(self.role);
    }
}
