//! Structured notifications emitted after each settled transition
//!
//! Rendering and sync collaborators subscribe through [`EventSink`]; the
//! engine never depends on them.

use crate::core::{FieldSlot, PlayerRef, Side};
use crate::game::opponent::OpponentMove;
use crate::game::scoring::OverReason;
use crate::game::{ActionKind, ActionOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A new match started
    KickOff { holder: PlayerRef, max_score: Option<u32> },
    /// A human action request was handled
    ActionResolved {
        kind: ActionKind,
        question_correct: bool,
        outcome: ActionOutcome,
        action_count: u32,
    },
    /// The ball changed hands within or across sides
    BallMoved { from: PlayerRef, to: PlayerRef },
    /// Possession flipped to `side`
    PossessionChanged { side: Side },
    /// Two players exchanged slots during a dribble
    SlotsSwapped {
        dribbler: PlayerRef,
        dribbler_slot: FieldSlot,
        beaten: PlayerRef,
        beaten_slot: FieldSlot,
    },
    /// All players returned to kickoff slots
    PositionsReset,
    /// A shot was struck; resolution follows after the suspense window
    ShotTaken { shooter: PlayerRef, slot: FieldSlot },
    ShotOffTarget { shooter: PlayerRef },
    ShotSaved { keeper: PlayerRef },
    Goal { side: Side, home_score: u32, away_score: u32 },
    CelebrationEnded { side: Side },
    /// Transient banner text changed (None clears it)
    Message { text: Option<String> },
    /// The opponent started deciding its next move
    OpponentThinking,
    /// The opponent made a move
    OpponentMoved { holder: PlayerRef, mv: OpponentMove },
    MatchOver { reason: OverReason },
    /// Ball flags were found inconsistent and repaired
    InvariantRepaired { holder: PlayerRef },
}

/// Subscriber for match events
pub trait EventSink {
    fn on_event(&mut self, event: &MatchEvent);
}

/// Sink that keeps every event it sees
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    pub events: Vec<MatchEvent>,
}

impl EventSink for EventRecorder {
    fn on_event(&mut self, event: &MatchEvent) {
        self.events.push(event.clone());
    }
}
