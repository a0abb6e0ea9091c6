//! Configuration and question bank loaders

pub mod config;
pub mod question_bank;

pub use config::{Difficulty, MatchConfig, Preferences, Timings, LANGUAGES};
pub use question_bank::{QuestionBank, QuestionRecord};
