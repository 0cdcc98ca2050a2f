//! Standard locations for SoundBlanket data files

use std::path::PathBuf;

/// Get the default data directory
///
/// Returns: `<platform data dir>/soundblanket`, e.g.
/// `~/.local/share/soundblanket` on Linux. Falls back to `./soundblanket`
/// when the platform has no data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("soundblanket")
}

/// Get the default config file path
///
/// # Arguments
/// * `filename` - Config file name (e.g., "config.yaml")
pub fn default_config_path(filename: &str) -> PathBuf {
    default_data_dir().join(filename)
}

/// Get the default mix store file
///
/// Returns: `<data dir>/mixes.json`
pub fn default_store_path() -> PathBuf {
    default_data_dir().join("mixes.json")
}
