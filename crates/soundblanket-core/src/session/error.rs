//! Session error types

use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned by [`super::SessionManager`] operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The id is not in the track catalog
    #[error("Unknown track: {0}")]
    UnknownTrack(String),

    /// A mix recall is already running
    #[error("A mix is already being loaded")]
    RecallInProgress,

    /// The engine rejected a load or call for a channel
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
