//! Shared test fixtures: a scripted audio engine and a failing store

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use soundblanket_core::engine::{
    AudioEngine, EngineError, EngineOp, EngineResult, LoadOptions, PlaybackStatus, SoundHandle,
    StatusSink,
};
use soundblanket_core::store::{KeyValueStore, StoreError, StoreResult};
use soundblanket_core::{Catalog, MemoryStore, SessionConfig, SessionManager};

/// One recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load { source: String, volume: f32 },
    Play(SoundHandle),
    Pause(SoundHandle),
    Stop(SoundHandle),
    SetVolume(SoundHandle, f32),
    SetLoop(SoundHandle, bool),
    Unload(SoundHandle),
}

/// In-memory engine that records every call and fails on request
pub struct ScriptedEngine {
    next_handle: AtomicU64,
    calls: Mutex<Vec<EngineCall>>,
    sources: Mutex<HashMap<SoundHandle, String>>,
    sinks: Mutex<HashMap<SoundHandle, StatusSink>>,
    failing_loads: Mutex<HashSet<String>>,
    failing_plays: Mutex<HashSet<String>>,
    failing_pauses: Mutex<HashSet<String>>,
    play_gate: Semaphore,
    gated: Mutex<bool>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            sources: Mutex::new(HashMap::new()),
            sinks: Mutex::new(HashMap::new()),
            failing_loads: Mutex::new(HashSet::new()),
            failing_plays: Mutex::new(HashSet::new()),
            failing_pauses: Mutex::new(HashSet::new()),
            play_gate: Semaphore::new(0),
            gated: Mutex::new(false),
        })
    }

    /// Make loads of track `id` fail
    pub fn fail_load(&self, id: &str) {
        self.failing_loads.lock().unwrap().insert(source_of(id));
    }

    /// Make play calls for track `id` fail
    pub fn fail_play(&self, id: &str) {
        self.failing_plays.lock().unwrap().insert(source_of(id));
    }

    /// Make pause calls for track `id` fail
    pub fn fail_pause(&self, id: &str) {
        self.failing_pauses.lock().unwrap().insert(source_of(id));
    }

    /// Park every play call until [`Self::release_plays`]
    pub fn hold_plays(&self) {
        *self.gated.lock().unwrap() = true;
    }

    pub fn release_plays(&self) {
        *self.gated.lock().unwrap() = false;
        self.play_gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_volume_calls(&self) -> Vec<f32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::SetVolume(_, v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn source(&self, handle: SoundHandle) -> EngineResult<String> {
        self.sources
            .lock()
            .unwrap()
            .get(&handle)
            .cloned()
            .ok_or_else(|| EngineError::call(EngineOp::Play, format!("unknown handle {}", handle)))
    }

    fn notify(&self, handle: SoundHandle, is_playing: bool) {
        if let Some(sink) = self.sinks.lock().unwrap().get(&handle) {
            let _ = sink.send(PlaybackStatus { handle, is_playing });
        }
    }

    /// Push a status notification unprompted, as after an interruption.
    ///
    /// Handles the engine never issued go through any registered sink.
    pub fn emit(&self, handle: SoundHandle, is_playing: bool) {
        let sinks = self.sinks.lock().unwrap();
        if let Some(sink) = sinks.get(&handle).or_else(|| sinks.values().next()) {
            sink.send(PlaybackStatus { handle, is_playing }).unwrap();
        }
    }
}

pub fn source_of(id: &str) -> String {
    format!("sounds/{}.mp3", id)
}

#[async_trait]
impl AudioEngine for ScriptedEngine {
    async fn load(&self, source: &str, options: LoadOptions) -> EngineResult<SoundHandle> {
        self.record(EngineCall::Load {
            source: source.to_string(),
            volume: options.volume,
        });
        tokio::task::yield_now().await;
        if self.failing_loads.lock().unwrap().contains(source) {
            return Err(EngineError::Load(format!("{} is missing", source)));
        }
        let handle = SoundHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.sources.lock().unwrap().insert(handle, source.to_string());
        Ok(handle)
    }

    async fn play(&self, handle: SoundHandle) -> EngineResult<()> {
        self.record(EngineCall::Play(handle));
        let gated = *self.gated.lock().unwrap();
        if gated {
            let _permit = self
                .play_gate
                .acquire()
                .await
                .map_err(|e| EngineError::call(EngineOp::Play, e.to_string()))?;
        }
        let source = self.source(handle)?;
        if self.failing_plays.lock().unwrap().contains(&source) {
            return Err(EngineError::call(EngineOp::Play, "device busy"));
        }
        self.notify(handle, true);
        Ok(())
    }

    async fn pause(&self, handle: SoundHandle) -> EngineResult<()> {
        self.record(EngineCall::Pause(handle));
        tokio::task::yield_now().await;
        let source = self.source(handle)?;
        if self.failing_pauses.lock().unwrap().contains(&source) {
            return Err(EngineError::call(EngineOp::Pause, "device busy"));
        }
        self.notify(handle, false);
        Ok(())
    }

    async fn stop(&self, handle: SoundHandle) -> EngineResult<()> {
        self.record(EngineCall::Stop(handle));
        self.notify(handle, false);
        Ok(())
    }

    async fn set_volume(&self, handle: SoundHandle, volume: f32) -> EngineResult<()> {
        self.record(EngineCall::SetVolume(handle, volume));
        Ok(())
    }

    async fn set_loop(&self, handle: SoundHandle, looping: bool) -> EngineResult<()> {
        self.record(EngineCall::SetLoop(handle, looping));
        Ok(())
    }

    async fn unload(&self, handle: SoundHandle) -> EngineResult<()> {
        self.record(EngineCall::Unload(handle));
        self.sinks.lock().unwrap().remove(&handle);
        self.sources.lock().unwrap().remove(&handle);
        Ok(())
    }

    fn watch_status(&self, handle: SoundHandle, sink: StatusSink) {
        self.sinks.lock().unwrap().insert(handle, sink);
    }
}

/// Store whose every call fails
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Backend("disk unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::Backend("disk unavailable".into()))
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::Backend("disk unavailable".into()))
    }
}

/// Memory store whose reads can be switched to fail
#[derive(Default)]
pub struct ReadFailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
}

impl ReadFailingStore {
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for ReadFailingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("read timed out".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Session over the builtin catalog with a zero settle delay
pub fn session(engine: &Arc<ScriptedEngine>) -> SessionManager {
    session_with(
        engine,
        SessionConfig {
            recall_settle_ms: 0,
            ..SessionConfig::default()
        },
    )
}

pub fn session_with(engine: &Arc<ScriptedEngine>, config: SessionConfig) -> SessionManager {
    init_logging();
    SessionManager::new(engine.clone(), Catalog::builtin(), &config)
}

/// Let the status listener drain pending engine notifications
pub async fn drain_status() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
