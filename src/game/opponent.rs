//! Opponent decision procedure
//!
//! Pure choice of the away side's next move from the current pitch. The
//! engine applies the move and schedules the next decision, so the whole
//! loop is driven by the scheduler instead of nested callbacks.
//!
//! Every branch either moves the ball closer to a shot or hands it to a
//! teammate who can; a dribble always lands on the past-defender slot where
//! the only option is to shoot.

use crate::core::{FieldSlot, Pitch, PlayerRef, Role};
use crate::game::dice::RandomSource;
use crate::game::rules;
use serde::{Deserialize, Serialize};

/// Outfield roles that take part in build-up play
const BUILD_UP: [Role; 3] = [Role::Midfielder1, Role::Midfielder2, Role::Attacker];

/// One opponent move; passes and dribbles always succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpponentMove {
    /// Keeper rolls the ball out, no thinking delay
    KeeperPass { to: Role },
    Pass { to: Role },
    /// Carry the ball to `target`, swapping with whoever stands there
    Dribble { target: FieldSlot },
    Shoot,
}

/// Choose the holder's next move
///
/// `distance_dribble` is the chance the attacker on the distance slot
/// dribbles in rather than shooting from range.
pub fn decide(
    pitch: &Pitch,
    holder: PlayerRef,
    distance_dribble: f64,
    rng: &mut dyn RandomSource,
) -> OpponentMove {
    let side = holder.side;
    let slot = pitch.slot_of(holder);
    let keeper_slot = FieldSlot::kickoff(side, Role::Goalkeeper);
    let attack_slot = FieldSlot::kickoff(side, Role::Attacker);
    let past_defender = rules::past_defender_slot(side);

    if holder.role == Role::Goalkeeper || slot == keeper_slot {
        let to = Role::MIDFIELDERS[rng.pick_index(Role::MIDFIELDERS.len())];
        return OpponentMove::KeeperPass { to };
    }

    if slot == past_defender {
        return OpponentMove::Shoot;
    }

    let can_dribble = beatable(pitch, holder);

    if slot == attack_slot {
        return if can_dribble && rng.chance(distance_dribble) {
            OpponentMove::Dribble {
                target: past_defender,
            }
        } else {
            OpponentMove::Shoot
        };
    }

    if slot == FieldSlot::kickoff(side, Role::Midfielder1)
        || slot == FieldSlot::kickoff(side, Role::Midfielder2)
    {
        if rng.chance(0.5) || !can_dribble {
            if let Some(to) = pick_build_up_receiver(holder, rng) {
                return OpponentMove::Pass { to };
            }
        }
        return OpponentMove::Dribble {
            target: past_defender,
        };
    }

    fallback_pass(pitch, holder, rng)
}

/// Single pass-or-dribble reply after a failed tackle
///
/// Returns `None` when the holder is not an outfield build-up player.
pub fn tackle_response(
    pitch: &Pitch,
    holder: PlayerRef,
    rng: &mut dyn RandomSource,
) -> Option<OpponentMove> {
    if !BUILD_UP.contains(&holder.role) {
        return None;
    }
    if rng.chance(0.5) || !beatable(pitch, holder) {
        pick_build_up_receiver(holder, rng).map(|to| OpponentMove::Pass { to })
    } else {
        Some(OpponentMove::Dribble {
            target: rules::past_defender_slot(holder.side),
        })
    }
}

/// An opponent stands on the holder's past-defender slot
///
/// A teammate left there by an earlier dribble blocks the dribble.
fn beatable(pitch: &Pitch, holder: PlayerRef) -> bool {
    pitch
        .occupant(rules::past_defender_slot(holder.side))
        .is_some_and(|who| who.side != holder.side)
}

fn pick_build_up_receiver(holder: PlayerRef, rng: &mut dyn RandomSource) -> Option<Role> {
    let candidates: Vec<Role> = BUILD_UP
        .iter()
        .copied()
        .filter(|&role| role != holder.role)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.pick_index(candidates.len())])
}

/// Unexpected slot: take the first reachable table destination, otherwise
/// any other build-up teammate
fn fallback_pass(pitch: &Pitch, holder: PlayerRef, rng: &mut dyn RandomSource) -> OpponentMove {
    if let Some(receiver) = rules::reachable_receivers(pitch, holder).first() {
        return OpponentMove::Pass { to: receiver.role };
    }
    let to = pick_build_up_receiver(holder, rng).unwrap_or(Role::Midfielder1);
    OpponentMove::Pass { to }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use crate::game::dice::ScriptedDice;

    fn away(role: Role) -> PlayerRef {
        PlayerRef::new(Side::Away, role)
    }

    #[test]
    fn test_keeper_always_passes_to_midfielder() {
        let pitch = Pitch::new();
        let mut dice = ScriptedDice::new([0.9]);
        assert_eq!(
            decide(&pitch, away(Role::Goalkeeper), 0.7, &mut dice),
            OpponentMove::KeeperPass { to: Role::Midfielder2 }
        );
    }

    #[test]
    fn test_past_defender_slot_must_shoot() {
        let mut pitch = Pitch::new();
        let mid = away(Role::Midfielder1);
        pitch.swap_slots(mid, PlayerRef::new(Side::Home, Role::Defender));
        let mut dice = ScriptedDice::new([]);
        assert_eq!(decide(&pitch, mid, 0.7, &mut dice), OpponentMove::Shoot);
        assert_eq!(dice.consumed(), 0);
    }

    #[test]
    fn test_attacker_distance_branch() {
        let pitch = Pitch::new();
        let mut dice = ScriptedDice::new([0.69, 0.71]);
        assert_eq!(
            decide(&pitch, away(Role::Attacker), 0.7, &mut dice),
            OpponentMove::Dribble { target: FieldSlot::of(2) }
        );
        assert_eq!(decide(&pitch, away(Role::Attacker), 0.7, &mut dice), OpponentMove::Shoot);
    }

    #[test]
    fn test_midfielder_pass_or_dribble() {
        let pitch = Pitch::new();
        // pass branch, second candidate (attacker)
        let mut dice = ScriptedDice::new([0.2, 0.9]);
        assert_eq!(
            decide(&pitch, away(Role::Midfielder1), 0.7, &mut dice),
            OpponentMove::Pass { to: Role::Attacker }
        );
        let mut dice = ScriptedDice::new([0.8]);
        assert_eq!(
            decide(&pitch, away(Role::Midfielder2), 0.7, &mut dice),
            OpponentMove::Dribble { target: FieldSlot::of(2) }
        );
    }

    #[test]
    fn test_fallback_from_unexpected_slot() {
        let mut pitch = Pitch::new();
        let def = away(Role::Defender);
        let mut dice = ScriptedDice::new([0.0]);
        // defender at its kickoff slot has no table destinations
        let mv = decide(&pitch, def, 0.7, &mut dice);
        assert_eq!(mv, OpponentMove::Pass { to: Role::Midfielder1 });

        // attacker displaced onto a home midfield slot
        pitch.swap_slots(away(Role::Attacker), PlayerRef::new(Side::Home, Role::Midfielder1));
        let mut dice = ScriptedDice::new([0.99]);
        let mv = decide(&pitch, away(Role::Attacker), 0.7, &mut dice);
        assert!(matches!(mv, OpponentMove::Pass { to } if to != Role::Attacker));
    }

    #[test]
    fn test_tackle_response() {
        let pitch = Pitch::new();
        let mut dice = ScriptedDice::new([0.1, 0.0]);
        assert_eq!(
            tackle_response(&pitch, away(Role::Attacker), &mut dice),
            Some(OpponentMove::Pass { to: Role::Midfielder1 })
        );
        let mut dice = ScriptedDice::new([0.6]);
        assert_eq!(
            tackle_response(&pitch, away(Role::Midfielder2), &mut dice),
            Some(OpponentMove::Dribble { target: FieldSlot::of(2) })
        );
        assert_eq!(tackle_response(&pitch, away(Role::Goalkeeper), &mut dice), None);
    }

    #[test]
    fn test_teammate_on_past_defender_slot_blocks_dribble() {
        // away mid1 was left behind the home defender by an earlier dribble
        let mut pitch = Pitch::new();
        pitch.swap_slots(away(Role::Midfielder1), PlayerRef::new(Side::Home, Role::Defender));

        let mut dice = ScriptedDice::new([0.0]);
        assert_eq!(decide(&pitch, away(Role::Attacker), 0.7, &mut dice), OpponentMove::Shoot);
        assert_eq!(dice.consumed(), 0);

        // dribble branch of the 50/50 falls back to a pass
        let mut dice = ScriptedDice::new([0.8, 0.0]);
        assert_eq!(
            decide(&pitch, away(Role::Midfielder2), 0.7, &mut dice),
            OpponentMove::Pass { to: Role::Midfielder1 }
        );

        let mut dice = ScriptedDice::new([0.8, 0.99]);
        assert_eq!(
            tackle_response(&pitch, away(Role::Midfielder2), &mut dice),
            Some(OpponentMove::Pass { to: Role::Attacker })
        );
    }
}
