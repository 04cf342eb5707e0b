use std::time::Duration;

use thiserror::Error;

use crate::engine::EngineError;

/// Everything a controller operation can report back to the player.
///
/// None of these are fatal to the process; each is scoped to the current
/// turn of one session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("It is not your turn")]
    NotHumanTurn,
    #[error("The game is over")]
    GameOver,
    #[error("Colour can only be chosen before the first move pair")]
    ColorLocked,
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("Engine did not answer within {0:?}")]
    EngineTimeout(Duration),
    #[error("Invalid position string: {0}")]
    InvalidInterchangeString(String),
}

impl SessionError {
    /// Text shown to the player. Internal defects get a generic message.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::InvalidInterchangeString(_) => {
                "Internal error while talking to the engine".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unavailable(reason) => SessionError::EngineUnavailable(reason),
            EngineError::Timeout(limit) => SessionError::EngineTimeout(limit),
            EngineError::Protocol(reason) => SessionError::InvalidInterchangeString(reason),
        }
    }
}
