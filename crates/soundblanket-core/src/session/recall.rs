//! Mix recall bookkeeping: the aggregate report and the in-progress guard

use std::sync::atomic::{AtomicBool, Ordering};

use super::SessionError;

/// One mix entry that did not start
#[derive(Debug, Clone, PartialEq)]
pub struct RecallFailure {
    pub id: String,
    pub error: SessionError,
}

/// Outcome of a mix recall
///
/// Every entry the record asked to play ends up in exactly one of
/// `started` or `failed`, in record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecallReport {
    /// Name of the recalled mix
    pub mix_name: String,
    /// Entries the record asked to play
    pub requested: usize,
    pub started: Vec<String>,
    pub failed: Vec<RecallFailure>,
}

impl RecallReport {
    pub(crate) fn new(mix_name: &str) -> Self {
        Self {
            mix_name: mix_name.to_string(),
            ..Self::default()
        }
    }

    /// True if every requested entry started
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.started.len() == self.requested
    }

    /// e.g. "6 of 7 sounds started"
    pub fn summary(&self) -> String {
        format!("{} of {} sounds started", self.started.len(), self.requested)
    }
}

/// Holds the recall-in-progress flag; clears it on drop
pub(crate) struct RecallGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RecallGuard<'a> {
    /// Set the flag, or return `None` if it was already set
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RecallGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
