//! Match engine: rules, possession state machine and controllers

pub mod actions;
pub mod controller;
pub mod dice;
pub mod engine;
pub mod events;
pub mod logger;
pub mod match_runner;
pub mod opponent;
pub mod probability;
pub mod random_controller;
pub mod rules;
pub mod scheduler;
pub mod scoring;
pub mod scripted_controller;
pub mod state;

pub use actions::{ActionKind, ActionOutcome, RejectReason};
pub use controller::{MatchView, PlayerController};
pub use dice::{RandomSource, ScriptedDice};
pub use engine::PossessionEngine;
pub use events::{EventRecorder, EventSink, MatchEvent};
pub use logger::{GameLogger, OutputFormat, OutputMode, VerbosityLevel};
pub use match_runner::{MatchEndReason, MatchResult, MatchRunner};
pub use opponent::OpponentMove;
pub use probability::{ActionProbabilities, QuestionModifier};
pub use random_controller::RandomController;
pub use scoring::{MatchOutcome, OverReason, ScoringController};
pub use scripted_controller::ScriptedController;
pub use state::{MatchState, Transition};
