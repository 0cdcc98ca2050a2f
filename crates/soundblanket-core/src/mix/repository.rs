//! Mix repository - records plus a name index over a key/value store
//!
//! # Persisted layout
//!
//! ```text
//! {prefix}mix_{name}   JSON MixRecord
//! {prefix}mixes_list   JSON array of names, in first-save order
//! ```
//!
//! Record and index are two separate writes. Save writes the record first
//! and delete removes it first, so an interrupted operation can at worst
//! leave an index entry with no record behind. Reads skip such entries.

use std::sync::Arc;

use chrono::Utc;

use super::{MixError, MixRecord, MixResult, ValidationError};
use crate::channel::ChannelSnapshot;
use crate::store::{KeyValueStore, StoreError};

/// Key prefix used unless the session config overrides it
pub const DEFAULT_KEY_PREFIX: &str = "@SoundBlanket:";

const INDEX_KEY: &str = "mixes_list";
const RECORD_KEY_PREFIX: &str = "mix_";

/// Saves, lists and deletes mixes
#[derive(Clone)]
pub struct MixRepository {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl MixRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(store, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn record_key(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, RECORD_KEY_PREFIX, name)
    }

    fn index_key(&self) -> String {
        format!("{}{}", self.prefix, INDEX_KEY)
    }

    /// Save the playing channels of `snapshot` under `name`.
    ///
    /// The name is trimmed. Fails with a [`ValidationError`], writing
    /// nothing, if it is empty or no channel is playing. Saving over an
    /// existing name keeps its `createdAt`, refreshes `updatedAt` and leaves
    /// the index alone.
    pub async fn save(&self, name: &str, snapshot: &[ChannelSnapshot]) -> MixResult<MixRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let mut record = MixRecord::from_snapshot(name, snapshot, Utc::now());
        if record.sounds.is_empty() {
            return Err(ValidationError::NothingToSave.into());
        }

        match self.get(name).await {
            Ok(Some(existing)) => record.created_at = existing.created_at,
            Ok(None) => {}
            Err(MixError::Corrupt { key, source }) => {
                log::warn!("save: replacing unreadable record {}: {}", key, source)
            }
            Err(e) => return Err(e),
        }

        let json = serde_json::to_string(&record).map_err(StoreError::from)?;
        self.store.set(&self.record_key(name), &json).await?;

        let mut names = self.names().await?;
        if names.iter().any(|n| n == name) {
            log::info!("save: overwrote mix '{}' ({} sounds)", name, record.sounds.len());
        } else {
            names.push(name.to_string());
            self.write_index(&names).await?;
            log::info!("save: created mix '{}' ({} sounds)", name, record.sounds.len());
        }
        Ok(record)
    }

    /// Load one mix. `Ok(None)` if no record exists under `name`.
    pub async fn get(&self, name: &str) -> MixResult<Option<MixRecord>> {
        let key = self.record_key(name.trim());
        let Some(json) = self.store.get(&key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| MixError::Corrupt { key, source })
    }

    /// The raw name index, in first-save order
    pub async fn names(&self) -> MixResult<Vec<String>> {
        let key = self.index_key();
        match self.store.get(&key).await? {
            Some(json) => serde_json::from_str(&json).map_err(|source| MixError::Corrupt { key, source }),
            None => Ok(Vec::new()),
        }
    }

    /// Every retrievable mix, most recently updated first.
    ///
    /// Index entries without a record, or whose record does not parse, are
    /// skipped with a warning.
    pub async fn list(&self) -> MixResult<Vec<MixRecord>> {
        let mut records = Vec::new();
        for name in self.names().await? {
            match self.get(&name).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => log::warn!("list: index entry '{}' has no record, skipping", name),
                Err(MixError::Corrupt { key, source }) => {
                    log::warn!("list: skipping unreadable record {}: {}", key, source)
                }
                Err(e) => return Err(e),
            }
        }
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    /// Remove the mix called `name`. Deleting an unknown name succeeds.
    pub async fn delete(&self, name: &str) -> MixResult<()> {
        let name = name.trim();
        self.store.delete(&self.record_key(name)).await?;

        let mut names = self.names().await?;
        let before = names.len();
        names.retain(|n| n != name);
        if names.len() != before {
            self.write_index(&names).await?;
            log::info!("delete: removed mix '{}'", name);
        } else {
            log::debug!("delete: no mix named '{}'", name);
        }
        Ok(())
    }

    async fn write_index(&self, names: &[String]) -> MixResult<()> {
        let json = serde_json::to_string(names).map_err(StoreError::from)?;
        self.store.set(&self.index_key(), &json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn snap(id: &str, is_playing: bool, volume: f32) -> ChannelSnapshot {
        ChannelSnapshot {
            id: id.into(),
            name: id.to_uppercase(),
            is_playing,
            volume,
            is_loading: false,
        }
    }

    fn repo() -> (Arc<MemoryStore>, MixRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = MixRepository::new(store.clone());
        (store, repo)
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let (store, repo) = repo();
        repo.save("Focus", &[snap("rain", true, 0.5)]).await.unwrap();
        assert_eq!(
            store.keys(),
            vec!["@SoundBlanket:mix_Focus", "@SoundBlanket:mixes_list"]
        );
    }

    #[tokio::test]
    async fn test_empty_name_writes_nothing() {
        let (store, repo) = repo();
        let result = repo.save("   ", &[snap("rain", true, 0.5)]).await;
        assert!(matches!(
            result,
            Err(MixError::Validation(ValidationError::EmptyName))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_name_is_trimmed() {
        let (_, repo) = repo();
        let record = repo.save("  Focus ", &[snap("rain", true, 0.5)]).await.unwrap();
        assert_eq!(record.name, "Focus");
        assert_eq!(repo.names().await.unwrap(), vec!["Focus"]);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_index_and_created_at() {
        let (_, repo) = repo();
        let first = repo.save("Focus", &[snap("rain", true, 0.5)]).await.unwrap();
        let second = repo
            .save("Focus", &[snap("wind", true, 0.3), snap("rain", false, 0.5)])
            .await
            .unwrap();

        assert_eq!(repo.names().await.unwrap(), vec!["Focus"]);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let stored = repo.get("Focus").await.unwrap().unwrap();
        assert_eq!(stored.sounds.len(), 1);
        assert_eq!(stored.sounds[0].id, "wind");
    }

    #[tokio::test]
    async fn test_list_sorted_by_updated_desc() {
        let (store, repo) = repo();
        for (name, at) in [
            ("Old", "2026-01-01T00:00:00Z"),
            ("New", "2026-03-01T00:00:00Z"),
            ("Mid", "2026-02-01T00:00:00Z"),
        ] {
            let mut record = MixRecord::from_snapshot(name, &[snap("rain", true, 0.5)], Utc::now());
            record.updated_at = at.parse().unwrap();
            store
                .set(&repo.record_key(name), &serde_json::to_string(&record).unwrap())
                .await
                .unwrap();
        }
        repo.write_index(&["Old".to_string(), "New".to_string(), "Mid".to_string()])
            .await
            .unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[tokio::test]
    async fn test_list_skips_dangling_and_corrupt_entries() {
        let (store, repo) = repo();
        repo.save("Good", &[snap("rain", true, 0.5)]).await.unwrap();
        store.set("@SoundBlanket:mix_Broken", "{not json").await.unwrap();
        repo.write_index(&["Good".to_string(), "Missing".to_string(), "Broken".to_string()])
            .await
            .unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Good");
        assert!(matches!(
            repo.get("Broken").await,
            Err(MixError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_replaces_corrupt_record() {
        let (store, repo) = repo();
        store.set("@SoundBlanket:mix_Focus", "{not json").await.unwrap();

        let record = repo.save("Focus", &[snap("rain", true, 0.5)]).await.unwrap();
        assert_eq!(repo.get("Focus").await.unwrap(), Some(record));
        assert_eq!(repo.names().await.unwrap(), vec!["Focus"]);
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let store = Arc::new(MemoryStore::new());
        let repo = MixRepository::with_prefix(store.clone(), "@Test:");
        repo.save("A", &[snap("rain", true, 0.5)]).await.unwrap();
        assert!(store.keys().iter().all(|k| k.starts_with("@Test:")));
    }
}
