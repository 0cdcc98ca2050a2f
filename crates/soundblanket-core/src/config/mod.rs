//! Session configuration
//!
//! Tunables for a mixer session, stored as YAML next to the mix store:
//!
//! - Default channel volume
//! - Volume debounce window
//! - Recall settle delay
//! - Storage key prefix
//!
//! # Usage
//!
//! ```ignore
//! use soundblanket_core::config::{default_config_path, load_config, SessionConfig};
//!
//! let config: SessionConfig = load_config(&default_config_path(CONFIG_FILENAME));
//! let config = config.sanitized();
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::{default_config_path, default_data_dir, default_store_path};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::{clamp_volume, DEFAULT_VOLUME};
use crate::mix::DEFAULT_KEY_PREFIX;

/// File name of the session config inside the data directory
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Session tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Volume new channels start at, in [0, 1]
    /// Default: 0.7
    pub default_volume: f32,

    /// Quiet period before a volume change reaches the engine
    /// Only the last change inside the window is applied.
    /// Default: 50 ms
    pub volume_debounce_ms: u64,

    /// Pause between stopping everything and starting a recalled mix
    /// Default: 300 ms
    pub recall_settle_ms: u64,

    /// Namespace for every key written to the mix store
    /// Default: "@SoundBlanket:"
    pub storage_key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            volume_debounce_ms: 50,
            recall_settle_ms: 300,
            storage_key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn volume_debounce(&self) -> Duration {
        Duration::from_millis(self.volume_debounce_ms)
    }

    pub fn recall_settle(&self) -> Duration {
        Duration::from_millis(self.recall_settle_ms)
    }

    /// Clamp out-of-range values loaded from disk
    ///
    /// The volume is clamped to [0, 1] and an empty key prefix falls back
    /// to the default.
    pub fn sanitized(mut self) -> Self {
        self.default_volume = clamp_volume(self.default_volume);
        if self.storage_key_prefix.trim().is_empty() {
            log::warn!("SessionConfig: empty storage key prefix, using default");
            self.storage_key_prefix = DEFAULT_KEY_PREFIX.to_string();
        }
        self
    }
}
