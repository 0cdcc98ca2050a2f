//! Session manager - orchestrates play, volume, stop and mix recall
//!
//! The [`SessionManager`] is the only writer of channel state. The UI issues
//! intents and reads snapshots, either on demand via
//! [`SessionManager::snapshot`] or pushed through [`SessionManager::subscribe`].
//!
//! # Concurrency rules
//!
//! - At most one state-changing engine call per channel is in flight. Play,
//!   pause and recall entries take the channel's transition (which also sets
//!   `is_loading`); volume updates only take the engine turn.
//! - `toggle_play` on a channel that is already mid-transition, or during a
//!   mix recall, is a no-op.
//! - Volume changes update local state immediately, then reach the engine
//!   through a per-channel debouncer: a newer change cancels the pending one.
//! - Cross-channel work (`stop_all`, recall entries) runs as independent
//!   tasks joined before the operation returns.
//! - `is_playing` follows engine status notifications: last confirmed wins,
//!   not last requested.
//!
//! # Recall
//!
//! ```text
//! acquire recall flag ──► stop_all ──► settle delay ──► spawn one task per
//! playing entry (transition: load → set volume → play) ──► join ──► report
//! ```

mod debounce;
mod error;
mod recall;

pub use debounce::Debouncer;
pub use error::{SessionError, SessionResult};
pub use recall::{RecallFailure, RecallReport};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use crate::catalog::Catalog;
use crate::channel::{Channel, ChannelRegistry, ChannelSnapshot, ChannelState};
use crate::config::SessionConfig;
use crate::engine::{AudioEngine, PlaybackStatus, StatusSink};
use crate::mix::MixRecord;
use recall::RecallGuard;

/// What a [`SessionManager::toggle_play`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The channel was stopped and is now playing
    Started,
    /// The channel was playing and is now paused
    Paused,
    /// A transition or a recall was already in flight; nothing happened
    Skipped,
}

struct SessionInner {
    engine: Arc<dyn AudioEngine>,
    registry: ChannelRegistry,
    debouncer: Debouncer,
    settle_delay: Duration,
    recalling: AtomicBool,
    status_tx: StatusSink,
    snapshot_tx: watch::Sender<Vec<ChannelSnapshot>>,
    status_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionInner {
    fn publish(&self) {
        self.snapshot_tx.send_replace(self.registry.snapshot());
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let task = self
            .status_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Owns the channel registry and mediates every request against it.
///
/// Cloning is cheap and yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Create a session over `catalog`, driving `engine`.
    ///
    /// Spawns the status listener, so this must be called from within a
    /// tokio runtime.
    pub fn new(engine: Arc<dyn AudioEngine>, catalog: Catalog, config: &SessionConfig) -> Self {
        let config = config.clone().sanitized();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(Vec::new());

        let inner = Arc::new(SessionInner {
            engine,
            registry: ChannelRegistry::new(catalog, config.default_volume),
            debouncer: Debouncer::new(config.volume_debounce()),
            settle_delay: config.recall_settle(),
            recalling: AtomicBool::new(false),
            status_tx,
            snapshot_tx,
            status_task: Mutex::new(None),
        });

        let listener = tokio::spawn(run_status_listener(Arc::downgrade(&inner), status_rx));
        *inner
            .status_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);

        log::info!(
            "SessionManager: {} tracks, debounce {:?}, settle {:?}",
            inner.registry.catalog().len(),
            inner.debouncer.window(),
            inner.settle_delay
        );
        Self { inner }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.inner.registry
    }

    fn channel(&self, id: &str) -> SessionResult<Arc<Channel>> {
        self.inner
            .registry
            .get_or_create(id)
            .ok_or_else(|| SessionError::UnknownTrack(id.to_string()))
    }

    /// Play a stopped channel or pause a playing one.
    ///
    /// Returns [`ToggleOutcome::Skipped`] without touching the engine if the
    /// channel is mid-transition or a mix recall is running. An engine
    /// failure leaves the channel not playing and is returned as
    /// [`SessionError::Engine`].
    pub async fn toggle_play(&self, id: &str) -> SessionResult<ToggleOutcome> {
        let channel = self.channel(id)?;
        let Some(claim) = channel.try_claim() else {
            log::debug!("toggle_play: '{}' is mid-transition, ignoring", id);
            return Ok(ToggleOutcome::Skipped);
        };
        // Checked after claiming: a recall that starts later sees the claim
        // in stop_all and waits for this transition.
        if self.is_recalling() {
            log::debug!("toggle_play: '{}' ignored while a mix is loading", id);
            return Ok(ToggleOutcome::Skipped);
        }
        self.inner.publish();

        let transition = claim.into_transition().await;
        let engine = self.inner.engine.as_ref();
        let result = if channel.state().is_playing {
            channel.pause(engine).await.map(|()| ToggleOutcome::Paused)
        } else {
            channel
                .start(engine, &self.inner.status_tx, None)
                .await
                .map(|()| ToggleOutcome::Started)
        };
        drop(transition);
        self.inner.publish();

        match result {
            Ok(outcome) => {
                log::debug!("toggle_play: '{}' {:?}", id, outcome);
                Ok(outcome)
            }
            Err(e) => {
                log::warn!("toggle_play: '{}' failed: {}", id, e);
                Err(e.into())
            }
        }
    }

    /// Set a channel's volume.
    ///
    /// The clamped value is stored and published immediately; the engine
    /// call follows after the debounce window, carrying only the latest
    /// value. Returns the clamped volume.
    pub fn change_volume(&self, id: &str, volume: f32) -> SessionResult<f32> {
        let channel = self.channel(id)?;
        let volume = channel.set_local_volume(volume);
        self.inner.publish();

        let engine = Arc::clone(&self.inner.engine);
        self.inner.debouncer.schedule(id, async move {
            let _turn = channel.engine_turn().await;
            if let Err(e) = channel.set_volume(engine.as_ref(), volume).await {
                log::warn!(
                    "change_volume: engine rejected {:.2} for '{}': {}",
                    volume,
                    channel.id(),
                    e
                );
            }
        });
        Ok(volume)
    }

    /// Pause every playing channel concurrently, then mark all stopped.
    ///
    /// Channels mid-transition are waited for first, so a start that was
    /// still in flight is paused once it lands. Individual pause failures
    /// are logged and otherwise ignored. Returns the number of channels
    /// that were paused.
    pub async fn stop_all(&self) -> usize {
        let active: Vec<_> = self
            .inner
            .registry
            .channels()
            .into_iter()
            .filter(|c| {
                let state = c.state();
                state.is_playing || state.is_loading
            })
            .collect();

        let mut tasks = JoinSet::new();
        for channel in active {
            let inner = Arc::clone(&self.inner);
            tasks.spawn(async move {
                let result = {
                    let _transition = channel.begin_transition().await;
                    if channel.state().is_playing {
                        inner.publish();
                        Some(channel.pause(inner.engine.as_ref()).await)
                    } else {
                        None
                    }
                };
                (channel, result)
            });
        }

        let mut count = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, None)) => {}
                Ok((channel, Some(result))) => {
                    count += 1;
                    if let Err(e) = result {
                        log::warn!("stop_all: pause failed for '{}': {}", channel.id(), e);
                    }
                }
                Err(e) => log::error!("stop_all: pause task failed: {}", e),
            }
        }

        for channel in self.inner.registry.channels() {
            channel.update(|s| s.is_playing = false);
        }
        self.inner.publish();
        log::info!("stop_all: stopped {} channels", count);
        count
    }

    /// Transition every channel to the state stored in `record`.
    ///
    /// Stops everything, waits for the settle delay, then starts each
    /// playing entry at its stored volume in parallel. One entry failing
    /// does not stop the others; the report lists what started and what
    /// did not. Fails with [`SessionError::RecallInProgress`], without
    /// touching any channel, if another recall is running. Toggles issued
    /// while the recall runs are skipped.
    pub async fn recall_mix(&self, record: &MixRecord) -> SessionResult<RecallReport> {
        let Some(_recall) = RecallGuard::acquire(&self.inner.recalling) else {
            log::warn!("recall_mix: '{}' rejected, a recall is already running", record.name);
            return Err(SessionError::RecallInProgress);
        };
        log::info!(
            "recall_mix: loading '{}' ({} sounds)",
            record.name,
            record.playing_count()
        );

        self.stop_all().await;
        if !self.inner.settle_delay.is_zero() {
            tokio::time::sleep(self.inner.settle_delay).await;
        }

        let mut report = RecallReport::new(&record.name);
        let mut outcomes = Vec::new();
        let mut tasks = JoinSet::new();

        for (index, sound) in record.sounds.iter().filter(|s| s.is_playing).enumerate() {
            report.requested += 1;
            let Some(channel) = self.inner.registry.get_or_create(&sound.id) else {
                let error = SessionError::UnknownTrack(sound.id.clone());
                outcomes.push((index, sound.id.clone(), Err(error)));
                continue;
            };

            // The recalled volume supersedes any drag still waiting to land.
            self.inner.debouncer.cancel(&sound.id);

            let inner = Arc::clone(&self.inner);
            let volume = sound.volume;
            tasks.spawn(async move {
                let result = {
                    let _transition = channel.begin_transition().await;
                    inner.publish();
                    channel
                        .start(inner.engine.as_ref(), &inner.status_tx, Some(volume))
                        .await
                };
                (index, channel, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, channel, result)) => {
                    let result = result.map_err(SessionError::from);
                    outcomes.push((index, channel.id().to_string(), result));
                }
                Err(e) => log::error!("recall_mix: entry task failed: {}", e),
            }
        }

        outcomes.sort_by_key(|(index, _, _)| *index);
        for (_, id, result) in outcomes {
            match result {
                Ok(()) => report.started.push(id),
                Err(error) => {
                    log::warn!("recall_mix: '{}' did not start: {}", id, error);
                    report.failed.push(RecallFailure { id, error });
                }
            }
        }

        self.inner.publish();
        log::info!("recall_mix: '{}' {}", record.name, report.summary());
        Ok(report)
    }

    /// Stop and unload every handle at the end of a session.
    ///
    /// Pending volume updates are dropped. Channels stay registered but
    /// become handle-less; a later toggle loads them again.
    pub async fn release_all(&self) {
        self.inner.debouncer.cancel_all();
        let channels = self.inner.registry.channels();
        for channel in &channels {
            let _turn = channel.engine_turn().await;
            channel.release(self.inner.engine.as_ref()).await;
        }
        self.inner.publish();
        log::info!("release_all: released {} channels", channels.len());
    }

    /// Current state of every created channel, in catalog order
    pub fn snapshot(&self) -> Vec<ChannelSnapshot> {
        self.inner.registry.snapshot()
    }

    /// Receive a fresh snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChannelSnapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// State of one channel, if it has been created
    pub fn channel_state(&self, id: &str) -> Option<ChannelState> {
        self.inner.registry.get(id).map(|c| c.state())
    }

    pub fn playing_count(&self) -> usize {
        self.snapshot().iter().filter(|s| s.is_playing).count()
    }

    pub fn is_recalling(&self) -> bool {
        self.inner.recalling.load(Ordering::Acquire)
    }
}

/// Merge engine status notifications into channel state until the session goes away
async fn run_status_listener(
    session: Weak<SessionInner>,
    mut status_rx: UnboundedReceiver<PlaybackStatus>,
) {
    while let Some(status) = status_rx.recv().await {
        let Some(inner) = session.upgrade() else {
            break;
        };
        match inner.registry.find_by_handle(status.handle) {
            Some(channel) => {
                if channel.apply_status(status.is_playing) {
                    log::debug!(
                        "status: '{}' confirmed is_playing={}",
                        channel.id(),
                        status.is_playing
                    );
                    inner.publish();
                }
            }
            None => log::debug!("status: no channel owns handle {}, ignoring", status.handle),
        }
    }
}
