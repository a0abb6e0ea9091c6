//! Basic pitch vocabulary: sides, roles, stances and field slots

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two teams on the pitch
///
/// Home ("blue") is the human side, Away ("red") is driven by the
/// opponent decision procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    /// The other team
    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Away => write!(f, "away"),
        }
    }
}

/// The five fixed roles of a roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(rename = "gk")]
    Goalkeeper,
    #[serde(rename = "def")]
    Defender,
    #[serde(rename = "mid1")]
    Midfielder1,
    #[serde(rename = "mid2")]
    Midfielder2,
    #[serde(rename = "att")]
    Attacker,
}

impl Role {
    /// Roster order, which is also kickoff slot order
    pub const ALL: [Role; 5] = [
        Role::Goalkeeper,
        Role::Defender,
        Role::Midfielder1,
        Role::Midfielder2,
        Role::Attacker,
    ];

    pub const MIDFIELDERS: [Role; 2] = [Role::Midfielder1, Role::Midfielder2];

    pub fn index(self) -> usize {
        match self {
            Role::Goalkeeper => 0,
            Role::Defender => 1,
            Role::Midfielder1 => 2,
            Role::Midfielder2 => 3,
            Role::Attacker => 4,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Role::Goalkeeper => "gk",
            Role::Defender => "def",
            Role::Midfielder1 => "mid1",
            Role::Midfielder2 => "mid2",
            Role::Attacker => "att",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Visual posture of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    #[default]
    Standing,
    Defending,
    Passing,
    Dribbling,
    Blocking,
    Celebration,
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stance::Standing => "standing",
            Stance::Defending => "defending",
            Stance::Passing => "passing",
            Stance::Dribbling => "dribbling",
            Stance::Blocking => "blocking",
            Stance::Celebration => "celebration",
        };
        f.write_str(name)
    }
}

/// Logical lane position on the pitch, 1 through 10
///
/// Slots 1-5 are the home kickoff formation (GK, DEF, MID1, MID2, ATT),
/// slots 6-10 the away formation in the same role order. Rendering maps
/// slots to coordinates elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FieldSlot(u8);

impl FieldSlot {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Build a slot from a literal known to be in range
    pub const fn of(slot: u8) -> Self {
        assert!(slot >= Self::MIN && slot <= Self::MAX, "field slot out of range");
        FieldSlot(slot)
    }

    pub fn new(slot: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&slot).then_some(FieldSlot(slot))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Kickoff slot of a role
    pub fn kickoff(side: Side, role: Role) -> Self {
        let base = match side {
            Side::Home => 1,
            Side::Away => 6,
        };
        FieldSlot(base + role.index() as u8)
    }
}

impl TryFrom<u8> for FieldSlot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FieldSlot::new(value).ok_or_else(|| format!("field slot {value} outside 1..=10"))
    }
}

impl From<FieldSlot> for u8 {
    fn from(slot: FieldSlot) -> u8 {
        slot.0
    }
}

impl fmt::Display for FieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to one of the ten players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerRef {
    pub side: Side,
    pub role: Role,
}

impl PlayerRef {
    pub fn new(side: Side, role: Role) -> Self {
        PlayerRef { side, role }
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.side, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kickoff_slots_cover_pitch() {
        let mut slots: Vec<u8> = Side::BOTH
            .iter()
            .flat_map(|&side| Role::ALL.iter().map(move |&role| FieldSlot::kickoff(side, role).get()))
            .collect();
        slots.sort_unstable();
        assert_eq!(slots, (1..=10).collect::<Vec<u8>>());
        assert_eq!(FieldSlot::kickoff(Side::Away, Role::Defender), FieldSlot::of(7));
        assert_eq!(FieldSlot::kickoff(Side::Home, Role::Attacker), FieldSlot::of(5));
    }

    #[test]
    fn test_slot_range() {
        assert!(FieldSlot::new(0).is_none());
        assert!(FieldSlot::new(11).is_none());
        assert_eq!(FieldSlot::new(7).map(FieldSlot::get), Some(7));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Role::Midfielder2).unwrap(), "\"mid2\"");
        assert_eq!(serde_json::to_string(&Side::Away).unwrap(), "\"away\"");
        assert_eq!(serde_json::to_string(&FieldSlot::of(9)).unwrap(), "9");
        assert!(serde_json::from_str::<FieldSlot>("12").is_err());
    }
}
