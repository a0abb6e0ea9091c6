//! Team rosters and the pitch holding both of them
//!
//! The roster model is plain data plus small positional queries. Only the
//! possession engine mutates it; every mutation that moves the ball goes
//! through [`Pitch::give_ball`], which clears all flags before setting the
//! new holder so no observer can ever see two balls.

use crate::core::{FieldSlot, Player, PlayerRef, Role, Side, Stance};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Fixed five-player roster of one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub side: Side,
    players: [Player; 5],
}

impl Roster {
    /// Roster lined up in kickoff formation, nobody holding the ball
    pub fn new(side: Side) -> Self {
        Roster {
            side,
            players: Role::ALL.map(|role| Player::kickoff(side, role)),
        }
    }

    pub fn get(&self, role: Role) -> &Player {
        &self.players[role.index()]
    }

    pub fn get_mut(&mut self, role: Role) -> &mut Player {
        &mut self.players[role.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    /// Role of the player standing on a slot, if it belongs to this roster
    pub fn role_at(&self, slot: FieldSlot) -> Option<Role> {
        self.players.iter().find(|p| p.slot == slot).map(|p| p.role)
    }

    pub fn reset_positions(&mut self) {
        let side = self.side;
        for player in self.players.iter_mut() {
            player.slot = FieldSlot::kickoff(side, player.role);
        }
    }

    pub fn set_all_stances(&mut self, stance: Stance) {
        for player in self.players.iter_mut() {
            player.stance = stance;
        }
    }
}

/// Both rosters: the complete set of ten players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub home: Roster,
    pub away: Roster,
}

impl Pitch {
    pub fn new() -> Self {
        Pitch {
            home: Roster::new(Side::Home),
            away: Roster::new(Side::Away),
        }
    }

    pub fn roster(&self, side: Side) -> &Roster {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn roster_mut(&mut self, side: Side) -> &mut Roster {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    pub fn player(&self, who: PlayerRef) -> &Player {
        self.roster(who.side).get(who.role)
    }

    pub fn player_mut(&mut self, who: PlayerRef) -> &mut Player {
        self.roster_mut(who.side).get_mut(who.role)
    }

    pub fn slot_of(&self, who: PlayerRef) -> FieldSlot {
        self.player(who).slot
    }

    /// Whoever currently stands on a slot, from either side
    pub fn occupant(&self, slot: FieldSlot) -> Option<PlayerRef> {
        Side::BOTH.iter().find_map(|&side| {
            self.roster(side)
                .role_at(slot)
                .map(|role| PlayerRef::new(side, role))
        })
    }

    /// All players flagged as holding the ball (exactly one when consistent)
    pub fn ball_holders(&self) -> SmallVec<[PlayerRef; 2]> {
        Side::BOTH
            .iter()
            .flat_map(|&side| {
                self.roster(side)
                    .iter()
                    .filter(|p| p.has_ball)
                    .map(move |p| PlayerRef::new(side, p.role))
            })
            .collect()
    }

    pub fn clear_ball(&mut self) {
        for side in Side::BOTH {
            for player in self.roster_mut(side).iter_mut() {
                player.has_ball = false;
            }
        }
    }

    /// Move the ball to a player in a single mutation
    pub fn give_ball(&mut self, to: PlayerRef, stance: Stance) {
        self.clear_ball();
        self.player_mut(to).take_ball(stance);
    }

    /// Exchange the slots of two players
    pub fn swap_slots(&mut self, a: PlayerRef, b: PlayerRef) {
        let slot_a = self.slot_of(a);
        let slot_b = self.slot_of(b);
        self.player_mut(a).slot = slot_b;
        self.player_mut(b).slot = slot_a;
    }

    pub fn reset_positions(&mut self) {
        self.home.reset_positions();
        self.away.reset_positions();
    }

    /// Return every player except `keep` to their resting stance
    pub fn settle_stances(&mut self, keep: PlayerRef) {
        for side in Side::BOTH {
            for player in self.roster_mut(side).iter_mut() {
                if side == keep.side && player.role == keep.role {
                    continue;
                }
                player.rest();
            }
        }
    }

    /// Slots must always form a permutation of 1..=10
    pub fn slots_are_distinct(&self) -> bool {
        let mut seen = [false; 11];
        for side in Side::BOTH {
            for player in self.roster(side).iter() {
                let idx = player.slot.get() as usize;
                if seen[idx] {
                    return false;
                }
                seen[idx] = true;
            }
        }
        true
    }
}

impl Default for Pitch {
    fn default() -> Self {
        Self::new()
    }
}
