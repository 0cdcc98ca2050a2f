//! Mixes - named, persisted snapshots of the playing channels
//!
//! A [`MixRecord`] keeps only the channels that were playing when it was
//! saved. Records and the name index live in a [`crate::store::KeyValueStore`]
//! behind the [`MixRepository`]; [`MixHandoff`] carries a chosen mix from the
//! browser to whatever recalls it.

mod error;
mod handoff;
mod repository;

pub use error::{MixError, MixResult, ValidationError};
pub use handoff::MixHandoff;
pub use repository::{MixRepository, DEFAULT_KEY_PREFIX};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelSnapshot;

/// One channel inside a saved mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixSound {
    pub id: String,
    pub name: String,
    pub is_playing: bool,
    pub volume: f32,
}

impl From<&ChannelSnapshot> for MixSound {
    fn from(snapshot: &ChannelSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            is_playing: snapshot.is_playing,
            volume: snapshot.volume,
        }
    }
}

/// A saved mix as stored under `mix_<name>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixRecord {
    pub name: String,
    pub sounds: Vec<MixSound>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MixRecord {
    /// Build a record from a full channel snapshot, keeping only playing channels
    pub fn from_snapshot(name: &str, snapshot: &[ChannelSnapshot], now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            sounds: snapshot
                .iter()
                .filter(|s| s.is_playing)
                .map(MixSound::from)
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Entries that will start when the mix is recalled
    pub fn playing_count(&self) -> usize {
        self.sounds.iter().filter(|s| s.is_playing).count()
    }

    /// Display names of the playing entries, in stored order
    pub fn sound_names(&self) -> Vec<&str> {
        self.sounds
            .iter()
            .filter(|s| s.is_playing)
            .map(|s| s.name.as_str())
            .collect()
    }
}
