//! Error types for quizball

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizballError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid question bank: {0}")]
    InvalidQuestionBank(String),

    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Scheduler did not settle after {0} continuations")]
    SchedulerStalled(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QuizballError>;
