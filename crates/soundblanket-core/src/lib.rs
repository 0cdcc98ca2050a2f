//! SoundBlanket Core - Ambient sound mixer session and mix persistence
//!
//! A fixed catalog of looping tracks, each with its own channel (play state,
//! volume, engine handle). Channels combine into a "mix" that can be saved
//! under a name and recalled later.
//!
//! # Architecture
//!
//! ```text
//! UI intents ──► SessionManager ──► ChannelRegistry ──► AudioEngine
//!                    │    ▲                                  │
//!          snapshots │    └──── PlaybackStatus (mpsc) ◄──────┘
//!                    ▼
//!               MixRepository ──► KeyValueStore
//!                    │
//!                    ▼
//!               MixHandoff ──► SessionManager::recall_mix
//! ```
//!
//! The audio engine and the durable store are external capabilities,
//! expressed as the [`engine::AudioEngine`] and [`store::KeyValueStore`]
//! traits.

pub mod catalog;
pub mod channel;
pub mod config;
pub mod engine;
pub mod mix;
pub mod session;
pub mod store;

pub use catalog::{Catalog, Category, TrackDescriptor};
pub use channel::{ChannelSnapshot, ChannelState, DEFAULT_VOLUME};
pub use config::SessionConfig;
pub use engine::{AudioEngine, EngineError, SoundHandle};
pub use mix::{MixError, MixHandoff, MixRecord, MixRepository, MixSound, ValidationError};
pub use session::{RecallReport, SessionError, SessionManager, ToggleOutcome};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
