//! Per-key cancelable timers
//!
//! Each key owns at most one pending task. Scheduling a new task for a key
//! aborts the previous one, so only the latest request inside the window
//! ever reaches its body.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `task` after the window, replacing whatever was pending for `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            task.await;
        });

        if let Some(previous) = self.lock_pending().insert(key.to_string(), handle) {
            previous.abort();
        }
    }

    /// Cancel the pending task for `key`. Returns true if one was still pending.
    pub fn cancel(&self, key: &str) -> bool {
        match self.lock_pending().remove(key) {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, handle) in self.lock_pending().drain() {
            handle.abort();
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.lock_pending()
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let fired = Arc::new(Mutex::new(Vec::new()));

        for value in [1, 2, 3] {
            let fired = Arc::clone(&fired);
            debouncer.schedule("rain", async move {
                fired.lock().unwrap().push(value);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*fired.lock().unwrap(), vec![3]);
        assert!(!debouncer.is_pending("rain"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let fired = Arc::new(Mutex::new(Vec::new()));

        for key in ["rain", "wind"] {
            let fired = Arc::clone(&fired);
            debouncer.schedule(key, async move {
                fired.lock().unwrap().push(key);
            });
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut fired = fired.lock().unwrap().clone();
        fired.sort();
        assert_eq!(fired, vec!["rain", "wind"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let fired = Arc::new(Mutex::new(false));

        let flag = Arc::clone(&fired);
        debouncer.schedule("storm", async move {
            *flag.lock().unwrap() = true;
        });
        assert!(debouncer.is_pending("storm"));
        assert!(debouncer.cancel("storm"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!*fired.lock().unwrap());
        assert!(!debouncer.cancel("storm"));
    }
}
