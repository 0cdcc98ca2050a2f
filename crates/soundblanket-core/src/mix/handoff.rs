//! Single-slot relay for a mix waiting to be recalled

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::MixRecord;

/// Holds at most one pending mix; each one is taken exactly once
#[derive(Debug, Default)]
pub struct MixHandoff {
    slot: Mutex<Option<MixRecord>>,
}

impl MixHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<MixRecord>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `record` as the pending mix. Returns the unconsumed one it replaced.
    pub fn set(&self, record: MixRecord) -> Option<MixRecord> {
        let replaced = self.lock().replace(record);
        if let Some(replaced) = &replaced {
            log::debug!("MixHandoff: '{}' replaced before it was taken", replaced.name);
        }
        replaced
    }

    /// Take the pending mix, leaving the slot empty
    pub fn take_if_present(&self) -> Option<MixRecord> {
        self.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(name: &str) -> MixRecord {
        MixRecord::from_snapshot(name, &[], Utc::now())
    }

    #[test]
    fn test_take_exactly_once() {
        let handoff = MixHandoff::new();
        assert!(handoff.set(record("Night")).is_none());
        assert!(handoff.is_pending());

        assert_eq!(handoff.take_if_present().unwrap().name, "Night");
        assert!(handoff.take_if_present().is_none());
        assert!(!handoff.is_pending());
    }

    #[test]
    fn test_set_overwrites_pending() {
        let handoff = MixHandoff::new();
        handoff.set(record("Night"));
        let replaced = handoff.set(record("Morning"));

        assert_eq!(replaced.unwrap().name, "Night");
        assert_eq!(handoff.take_if_present().unwrap().name, "Morning");
    }
}
