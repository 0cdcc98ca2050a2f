//! Channels - one per track, owning its engine handle and local state
//!
//! A [`Channel`] pairs a track with its play/volume/loading state and the
//! engine handle once loaded. State lives behind a short-lived std mutex so
//! reads never wait on the engine; engine calls for the same channel are
//! serialized through a separate async mutex so at most one of them is in
//! flight at a time.

mod registry;

pub use registry::ChannelRegistry;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::catalog::TrackDescriptor;
use crate::engine::{AudioEngine, EngineResult, LoadOptions, SoundHandle, StatusSink};

/// Volume a channel starts with before the user touches it
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Clamp a requested volume into [0, 1]. NaN maps to silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Mutable state of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    pub is_playing: bool,
    pub volume: f32,
    /// A load/play/pause transition is in flight
    pub is_loading: bool,
    /// Set once the track has been loaded this session
    pub handle: Option<SoundHandle>,
}

impl ChannelState {
    fn new(volume: f32) -> Self {
        Self {
            is_playing: false,
            volume: clamp_volume(volume),
            is_loading: false,
            handle: None,
        }
    }
}

/// Read-only view of a channel handed to the UI and to mix saving
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshot {
    pub id: String,
    pub name: String,
    pub is_playing: bool,
    pub volume: f32,
    pub is_loading: bool,
}

/// Runtime unit for one track
#[derive(Debug)]
pub struct Channel {
    descriptor: TrackDescriptor,
    state: Mutex<ChannelState>,
    engine_turn: tokio::sync::Mutex<()>,
}

impl Channel {
    pub(crate) fn new(descriptor: TrackDescriptor, volume: f32) -> Self {
        Self {
            descriptor,
            state: Mutex::new(ChannelState::new(volume)),
            engine_turn: tokio::sync::Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &TrackDescriptor {
        &self.descriptor
    }

    /// Copy of the current state
    pub fn state(&self) -> ChannelState {
        self.lock_state().clone()
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        let state = self.lock_state();
        ChannelSnapshot {
            id: self.descriptor.id.clone(),
            name: self.descriptor.display_name.clone(),
            is_playing: state.is_playing,
            volume: state.volume,
            is_loading: state.is_loading,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate state under the lock
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ChannelState) -> R) -> R {
        f(&mut self.lock_state())
    }

    /// Set `is_loading` unless a transition is already in flight.
    ///
    /// Returns `None` (and changes nothing) if one is. The claim clears
    /// `is_loading` if it is dropped before becoming a [`Transition`].
    pub(crate) fn try_claim(&self) -> Option<LoadingClaim<'_>> {
        let claimed = self.update(|s| {
            if s.is_loading {
                false
            } else {
                s.is_loading = true;
                true
            }
        });
        claimed.then_some(LoadingClaim { channel: self })
    }

    /// Wait for this channel's engine turn without flagging a transition.
    ///
    /// Used for volume updates, which must not block toggles.
    pub(crate) async fn engine_turn(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.engine_turn.lock().await
    }

    /// Wait for this channel's engine turn and flag a transition.
    ///
    /// `is_loading` stays set until the returned guard is dropped, and is
    /// cleared before the engine turn is released.
    pub(crate) async fn begin_transition(&self) -> Transition<'_> {
        let turn = self.engine_turn.lock().await;
        self.update(|s| s.is_loading = true);
        Transition {
            channel: self,
            _turn: turn,
        }
    }

    /// Store a volume locally without touching the engine. Returns the clamped value.
    pub(crate) fn set_local_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.update(|s| s.volume = volume);
        volume
    }

    /// Merge an engine status notification. Returns true if state changed.
    pub(crate) fn apply_status(&self, is_playing: bool) -> bool {
        self.update(|s| {
            let changed = s.is_playing != is_playing;
            s.is_playing = is_playing;
            changed
        })
    }

    /// Load the track if this channel has no handle yet.
    ///
    /// The handle is created paused and looping at the channel's current
    /// volume, and `sink` is registered for its status notifications. On
    /// failure the channel stays handle-less and `is_loading` is cleared.
    /// Callers hold the engine turn.
    pub async fn ensure_loaded(
        &self,
        engine: &dyn AudioEngine,
        sink: &StatusSink,
    ) -> EngineResult<SoundHandle> {
        let (handle, volume) = {
            let state = self.lock_state();
            (state.handle, state.volume)
        };
        if let Some(handle) = handle {
            return Ok(handle);
        }

        log::debug!("ensure_loaded: loading '{}' from {}", self.id(), self.descriptor.source);
        match engine
            .load(&self.descriptor.source, LoadOptions::paused_loop(volume))
            .await
        {
            Ok(handle) => {
                engine.watch_status(handle, sink.clone());
                self.update(|s| s.handle = Some(handle));
                log::info!("ensure_loaded: '{}' loaded as {}", self.id(), handle);
                Ok(handle)
            }
            Err(e) => {
                log::warn!("ensure_loaded: '{}' failed to load: {}", self.id(), e);
                self.update(|s| s.is_loading = false);
                Err(e)
            }
        }
    }

    /// Clamp and store `volume`, then apply it to the handle if there is one.
    ///
    /// Without a handle the value is only stored; it is used on the next load.
    pub async fn set_volume(&self, engine: &dyn AudioEngine, volume: f32) -> EngineResult<f32> {
        let volume = self.set_local_volume(volume);
        let handle = self.lock_state().handle;
        if let Some(handle) = handle {
            engine.set_volume(handle, volume).await?;
        }
        Ok(volume)
    }

    /// Load if needed, apply volume, play.
    ///
    /// `is_playing` becomes true only once play resolves; any failure leaves
    /// the channel not playing. Callers hold a [`Transition`].
    pub(crate) async fn start(
        &self,
        engine: &dyn AudioEngine,
        sink: &StatusSink,
        volume: Option<f32>,
    ) -> EngineResult<()> {
        if let Some(volume) = volume {
            self.set_local_volume(volume);
        }

        let result = async {
            let handle = self.ensure_loaded(engine, sink).await?;
            let volume = self.lock_state().volume;
            engine.set_volume(handle, volume).await?;
            engine.play(handle).await
        }
        .await;

        self.update(|s| s.is_playing = result.is_ok());
        result
    }

    /// Pause if loaded. The channel ends up not playing either way.
    pub(crate) async fn pause(&self, engine: &dyn AudioEngine) -> EngineResult<()> {
        let handle = self.lock_state().handle;
        let result = match handle {
            Some(handle) => engine.pause(handle).await,
            None => Ok(()),
        };
        self.update(|s| s.is_playing = false);
        result
    }

    /// Stop and unload the handle, leaving the channel handle-less.
    ///
    /// Engine failures are logged; the handle is dropped regardless.
    pub(crate) async fn release(&self, engine: &dyn AudioEngine) {
        let Some(handle) = self.update(|s| {
            s.is_playing = false;
            s.handle.take()
        }) else {
            return;
        };

        if let Err(e) = engine.stop(handle).await {
            log::warn!("release: stop failed for '{}': {}", self.id(), e);
        }
        if let Err(e) = engine.unload(handle).await {
            log::warn!("release: unload failed for '{}': {}", self.id(), e);
        }
        log::debug!("release: '{}' released {}", self.id(), handle);
    }
}

/// `is_loading` taken ahead of the engine turn, see [`Channel::try_claim`]
pub(crate) struct LoadingClaim<'a> {
    channel: &'a Channel,
}

impl<'a> LoadingClaim<'a> {
    /// Wait for the engine turn, keeping `is_loading` set throughout
    pub(crate) async fn into_transition(self) -> Transition<'a> {
        let transition = self.channel.begin_transition().await;
        // The transition now owns clearing the flag.
        std::mem::forget(self);
        transition
    }
}

impl Drop for LoadingClaim<'_> {
    fn drop(&mut self) {
        self.channel.update(|s| s.is_loading = false);
    }
}

/// Exclusive engine turn with `is_loading` set, see [`Channel::begin_transition`]
pub(crate) struct Transition<'a> {
    channel: &'a Channel,
    _turn: tokio::sync::MutexGuard<'a, ()>,
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        // Runs before `_turn` is released.
        self.channel.update(|s| s.is_loading = false);
    }
}
