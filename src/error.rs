use crate::store::StoreError;

/// Result type for room operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors reported to whoever invoked a room operation
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl GameError {
    /// Wire code sent to clients in `ServerMessage::Error`
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::InvalidInput(_) => "INVALID_INPUT",
            GameError::IllegalTransition(_) => "ILLEGAL_TRANSITION",
            GameError::StoreFailure(_) => "STORE_FAILURE",
        }
    }
}
