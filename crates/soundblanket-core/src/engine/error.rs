//! Audio engine error types

use std::fmt;

use thiserror::Error;

/// Engine operations that can fail after a handle exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOp {
    Play,
    Pause,
    Stop,
    SetVolume,
    SetLoop,
    Unload,
}

impl EngineOp {
    /// Name used in log lines and error messages
    pub fn name(&self) -> &'static str {
        match self {
            EngineOp::Play => "play",
            EngineOp::Pause => "pause",
            EngineOp::Stop => "stop",
            EngineOp::SetVolume => "set_volume",
            EngineOp::SetLoop => "set_loop",
            EngineOp::Unload => "unload",
        }
    }
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors reported by the audio engine capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine could not produce a playable handle (missing or corrupt asset)
    #[error("Failed to load sound: {0}")]
    Load(String),

    /// An asynchronous call on an existing handle was rejected
    #[error("Engine call '{op}' failed: {message}")]
    Call { op: EngineOp, message: String },
}

impl EngineError {
    /// Shorthand for a rejected call
    pub fn call(op: EngineOp, message: impl Into<String>) -> Self {
        EngineError::Call {
            op,
            message: message.into(),
        }
    }

    /// True if this is a load failure
    pub fn is_load(&self) -> bool {
        matches!(self, EngineError::Load(_))
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
