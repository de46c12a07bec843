use thiserror::Error;

use crate::api::ApiError;

/// Why a session action was not applied
#[derive(Debug, Error)]
pub enum SessionError {
    /// Rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// The backend could not be reached or refused the request
    #[error(transparent)]
    Transport(#[from] ApiError),

    /// The action clashes with the current edit session or with another writer
    #[error("{0}")]
    Conflict(String),
}

impl SessionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
