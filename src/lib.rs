//! Quizball - a quiz-gated five-a-side football match engine
//!
//! Every human action is gated by a multiple-choice question. The answer
//! shifts the action's success probability; the engine then resolves the
//! action, stages its transitions on a virtual clock and drives the
//! opponent side.

pub mod batch;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod remote;

pub use error::{QuizballError, Result};
