//! Audio engine capability
//!
//! The decode/playback primitives live outside this crate. Whatever backend
//! plays the loops implements [`AudioEngine`]; the session only ever talks
//! to it through this trait.
//!
//! # Status notifications
//!
//! The engine is the source of truth for whether a handle is actually
//! playing. After a successful load the channel registers a [`StatusSink`]
//! with [`AudioEngine::watch_status`], and the engine pushes a
//! [`PlaybackStatus`] whenever playback starts or stops. The session merges
//! those into channel state (last confirmed wins).

mod error;

pub use error::{EngineError, EngineOp, EngineResult};

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

/// Opaque handle to a loaded sound, allocated by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundHandle(pub u64);

impl fmt::Display for SoundHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Initial playback parameters for [`AudioEngine::load`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Volume in [0, 1]
    pub volume: f32,
    /// Loop the sound when it reaches the end
    pub looping: bool,
    /// Start playing immediately after loading
    pub should_play: bool,
}

impl LoadOptions {
    /// Looping, paused, at the given volume (how channels load their tracks)
    pub fn paused_loop(volume: f32) -> Self {
        Self {
            volume,
            looping: true,
            should_play: false,
        }
    }
}

/// Playback state notification pushed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub handle: SoundHandle,
    pub is_playing: bool,
}

/// Where the engine delivers [`PlaybackStatus`] notifications
pub type StatusSink = UnboundedSender<PlaybackStatus>;

/// Asynchronous playback capability
///
/// Every call may suspend and every call may fail. Implementations must be
/// shareable across tasks.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Load a sound from an asset reference
    async fn load(&self, source: &str, options: LoadOptions) -> EngineResult<SoundHandle>;

    /// Start or resume playback
    async fn play(&self, handle: SoundHandle) -> EngineResult<()>;

    /// Pause playback, keeping the position
    async fn pause(&self, handle: SoundHandle) -> EngineResult<()>;

    /// Stop playback and rewind
    async fn stop(&self, handle: SoundHandle) -> EngineResult<()>;

    /// Set the volume in [0, 1]
    async fn set_volume(&self, handle: SoundHandle, volume: f32) -> EngineResult<()>;

    /// Enable or disable looping
    async fn set_loop(&self, handle: SoundHandle, looping: bool) -> EngineResult<()>;

    /// Release the handle and its decoded resources
    async fn unload(&self, handle: SoundHandle) -> EngineResult<()>;

    /// Register the sink that receives status notifications for `handle`
    fn watch_status(&self, handle: SoundHandle, sink: StatusSink);
}
