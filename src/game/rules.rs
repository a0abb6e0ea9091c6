//! Slot tables: where the ball may go from where
//!
//! All tables are written for the home side and mirrored for the away side
//! by adding or subtracting five (home slot `n` mirrors to away slot `n + 5`,
//! and the away "past defender" slot 2 mirrors home slot 7).

use crate::core::{FieldSlot, Pitch, PlayerRef, Side};
use smallvec::SmallVec;

/// Home slots from which a shot may be taken
const HOME_SHOOT_SLOTS: [u8; 4] = [5, 7, 8, 9];
/// Away slots from which a shot may be taken
const AWAY_SHOOT_SLOTS: [u8; 2] = [10, 2];

/// How far out a shot is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotRange {
    /// Attacker/midfielder slots short of the defensive line
    Distance,
    /// The slot behind the beaten defender
    PastDefender,
}

/// Slot behind the opposing defender for a side
pub fn past_defender_slot(side: Side) -> FieldSlot {
    match side {
        Side::Home => FieldSlot::of(7),
        Side::Away => FieldSlot::of(2),
    }
}

/// Whether a side holding the ball at `slot` may shoot
pub fn can_shoot(side: Side, slot: FieldSlot) -> bool {
    let slot = slot.get();
    match side {
        Side::Home => HOME_SHOOT_SLOTS.contains(&slot),
        Side::Away => AWAY_SHOOT_SLOTS.contains(&slot),
    }
}

/// Range class used for the on-target roll
pub fn shot_range(side: Side, slot: FieldSlot) -> ShotRange {
    if slot == past_defender_slot(side) {
        ShotRange::PastDefender
    } else {
        ShotRange::Distance
    }
}

fn mirror(side: Side, slot: u8) -> u8 {
    match side {
        Side::Home => slot,
        Side::Away => {
            if slot > 5 {
                slot - 5
            } else {
                slot + 5
            }
        }
    }
}

/// Candidate pass destinations from a slot (empty when passing is illegal)
///
/// Goalkeeper and midfielder slots have two candidates picked 50/50. A
/// midfielder who dribbled into the opposing midfield may only lay the ball
/// off to the attacker. Attacker and past-defender slots cannot pass.
pub fn pass_targets(side: Side, slot: FieldSlot) -> Vec<FieldSlot> {
    let home_view: &[u8] = match mirror(side, slot.get()) {
        1 => &[3, 4],
        3 => &[4, 5],
        4 => &[3, 5],
        8 | 9 => &[5],
        _ => &[],
    };
    home_view
        .iter()
        .map(|&s| FieldSlot::of(mirror(side, s)))
        .collect()
}

/// Slot a dribble from `slot` carries the ball to, if dribbling is legal there
///
/// The dribbler swaps places with whoever stands on the returned slot:
/// home 3 -> 8 (opposing mid1), 4 -> 9 (opposing mid2), 5 -> 7 (opposing
/// defender); mirrored for the away side.
pub fn dribble_target(side: Side, slot: FieldSlot) -> Option<FieldSlot> {
    let target = match mirror(side, slot.get()) {
        3 => 8,
        4 => 9,
        5 => 7,
        _ => return None,
    };
    Some(FieldSlot::of(mirror(side, target)))
}

/// Teammates the holder can legally pass to right now
///
/// Table destinations currently occupied by an opponent (after a dribble
/// swap) are not reachable.
pub fn reachable_receivers(pitch: &Pitch, holder: PlayerRef) -> SmallVec<[PlayerRef; 2]> {
    pass_targets(holder.side, pitch.slot_of(holder))
        .into_iter()
        .filter_map(|slot| pitch.occupant(slot))
        .filter(|who| who.side == holder.side && *who != holder)
        .collect()
}

/// Destination slot and beaten opponent of a legal dribble
pub fn dribble_move(pitch: &Pitch, holder: PlayerRef) -> Option<(FieldSlot, PlayerRef)> {
    let target = dribble_target(holder.side, pitch.slot_of(holder))?;
    let beaten = pitch.occupant(target)?;
    (beaten.side != holder.side).then_some((target, beaten))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;

    #[test]
    fn test_reachable_receivers_skip_opponents() {
        let mut pitch = Pitch::new();
        let mid1 = PlayerRef::new(Side::Home, Role::Midfielder1);
        let mid2 = PlayerRef::new(Side::Home, Role::Midfielder2);
        let att = PlayerRef::new(Side::Home, Role::Attacker);
        assert_eq!(reachable_receivers(&pitch, mid1).as_slice(), &[mid2, att]);

        // home mid2 dribbled past away mid2: slot 4 is now an opponent
        pitch.swap_slots(mid2, PlayerRef::new(Side::Away, Role::Midfielder2));
        assert_eq!(reachable_receivers(&pitch, mid1).as_slice(), &[att]);
        assert!(reachable_receivers(&pitch, att).is_empty());
        assert_eq!(reachable_receivers(&pitch, mid2).as_slice(), &[att]);
    }

    #[test]
    fn test_dribble_move() {
        let pitch = Pitch::new();
        let att = PlayerRef::new(Side::Home, Role::Attacker);
        assert_eq!(
            dribble_move(&pitch, att),
            Some((FieldSlot::of(7), PlayerRef::new(Side::Away, Role::Defender)))
        );
        assert_eq!(dribble_move(&pitch, PlayerRef::new(Side::Home, Role::Goalkeeper)), None);
    }

    fn slots(raw: &[u8]) -> Vec<FieldSlot> {
        raw.iter().map(|&s| FieldSlot::of(s)).collect()
    }

    #[test]
    fn test_can_shoot_table() {
        for slot in 1..=10u8 {
            let s = FieldSlot::of(slot);
            assert_eq!(can_shoot(Side::Home, s), [5, 7, 8, 9].contains(&slot), "home {slot}");
            assert_eq!(can_shoot(Side::Away, s), [10, 2].contains(&slot), "away {slot}");
        }
    }

    #[test]
    fn test_pass_targets_home() {
        assert_eq!(pass_targets(Side::Home, FieldSlot::of(1)), slots(&[3, 4]));
        assert_eq!(pass_targets(Side::Home, FieldSlot::of(3)), slots(&[4, 5]));
        assert_eq!(pass_targets(Side::Home, FieldSlot::of(4)), slots(&[3, 5]));
        assert_eq!(pass_targets(Side::Home, FieldSlot::of(8)), slots(&[5]));
        assert!(pass_targets(Side::Home, FieldSlot::of(5)).is_empty());
        assert!(pass_targets(Side::Home, FieldSlot::of(7)).is_empty());
    }

    #[test]
    fn test_pass_targets_away_mirror() {
        assert_eq!(pass_targets(Side::Away, FieldSlot::of(6)), slots(&[8, 9]));
        assert_eq!(pass_targets(Side::Away, FieldSlot::of(8)), slots(&[9, 10]));
        assert_eq!(pass_targets(Side::Away, FieldSlot::of(9)), slots(&[8, 10]));
        assert!(pass_targets(Side::Away, FieldSlot::of(10)).is_empty());
        assert!(pass_targets(Side::Away, FieldSlot::of(2)).is_empty());
    }

    #[test]
    fn test_dribble_targets() {
        assert_eq!(dribble_target(Side::Home, FieldSlot::of(5)), Some(FieldSlot::of(7)));
        assert_eq!(dribble_target(Side::Home, FieldSlot::of(3)), Some(FieldSlot::of(8)));
        assert_eq!(dribble_target(Side::Home, FieldSlot::of(4)), Some(FieldSlot::of(9)));
        assert_eq!(dribble_target(Side::Home, FieldSlot::of(1)), None);
        assert_eq!(dribble_target(Side::Home, FieldSlot::of(7)), None);
        assert_eq!(dribble_target(Side::Away, FieldSlot::of(10)), Some(FieldSlot::of(2)));
        assert_eq!(dribble_target(Side::Away, FieldSlot::of(8)), Some(FieldSlot::of(3)));
        assert_eq!(dribble_target(Side::Away, FieldSlot::of(9)), Some(FieldSlot::of(4)));
    }

    #[test]
    fn test_shot_range() {
        assert_eq!(shot_range(Side::Home, FieldSlot::of(7)), ShotRange::PastDefender);
        assert_eq!(shot_range(Side::Home, FieldSlot::of(5)), ShotRange::Distance);
        assert_eq!(shot_range(Side::Away, FieldSlot::of(2)), ShotRange::PastDefender);
        assert_eq!(shot_range(Side::Away, FieldSlot::of(10)), ShotRange::Distance);
    }
}
