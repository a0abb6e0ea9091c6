//! Roster model: players, rosters and field slots

pub mod player;
pub mod roster;
pub mod types;

pub use player::Player;
pub use roster::{Pitch, Roster};
pub use types::{FieldSlot, PlayerRef, Role, Side, Stance};
