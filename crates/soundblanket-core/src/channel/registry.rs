//! Channel registry - lazily created channels keyed by track id

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{clamp_volume, Channel, ChannelSnapshot};
use crate::catalog::Catalog;
use crate::engine::SoundHandle;

/// Owns every channel of a session.
///
/// Channels are created on first reference and never evicted; the catalog
/// bounds how many can exist. Iteration follows catalog order.
#[derive(Debug)]
pub struct ChannelRegistry {
    catalog: Catalog,
    default_volume: f32,
    channels: RwLock<HashMap<String, Arc<Channel>>>,
}

impl ChannelRegistry {
    pub fn new(catalog: Catalog, default_volume: f32) -> Self {
        Self {
            catalog,
            default_volume: clamp_volume(default_volume),
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get the channel for `id`, creating it on first call.
    ///
    /// Returns `None` if `id` is not in the catalog.
    pub fn get_or_create(&self, id: &str) -> Option<Arc<Channel>> {
        if let Some(channel) = self.get(id) {
            return Some(channel);
        }

        let descriptor = self.catalog.get(id)?;
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        let channel = channels.entry(id.to_string()).or_insert_with(|| {
            log::debug!("get_or_create: creating channel '{}'", id);
            Arc::new(Channel::new(descriptor.clone(), self.default_volume))
        });
        Some(Arc::clone(channel))
    }

    /// Existing channel for `id`, without creating one
    pub fn get(&self, id: &str) -> Option<Arc<Channel>> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// All created channels in catalog order
    pub fn channels(&self) -> Vec<Arc<Channel>> {
        let mut channels: Vec<_> = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        channels.sort_by_key(|c| self.catalog.position(c.id()));
        channels
    }

    /// Channel currently owning `handle`
    pub fn find_by_handle(&self, handle: SoundHandle) -> Option<Arc<Channel>> {
        self.channels()
            .into_iter()
            .find(|c| c.state().handle == Some(handle))
    }

    /// Snapshot of every created channel in catalog order
    pub fn snapshot(&self) -> Vec<ChannelSnapshot> {
        self.channels().iter().map(|c| c.snapshot()).collect()
    }

    /// Number of created channels
    pub fn len(&self) -> usize {
        self.channels.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
