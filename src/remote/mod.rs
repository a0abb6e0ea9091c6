//! External collaborators: session sync and quiz
//!
//! Both are optional. Each facade catches collaborator failures, logs them
//! and substitutes a local value of the same shape, so a match is fully
//! playable without any service.

pub mod quiz;
pub mod session;

use thiserror::Error;

pub use quiz::{format_category_name, Question, QuizFacade, QuizService, FALLBACK_CATEGORIES};
pub use session::{
    ActionReport, LocalSessionService, OfflineService, RemoteSync, SessionInfo, SessionService,
};

/// Failure of a collaborator call; never reaches the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<RemoteError> for crate::QuizballError {
    fn from(err: RemoteError) -> Self {
        crate::QuizballError::RemoteUnavailable(err.to_string())
    }
}
