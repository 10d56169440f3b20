//! Cross-tab logout signal

use super::SharedStorage;
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Storage key written on logout; the value is a Unix-millis timestamp
pub const LOGOUT_SIGNAL_KEY: &str = "auth_logout";

/// Publish/subscribe view of the logout key for a single tab
///
/// A tab reacts only to values written by other tabs after it started.
#[derive(Debug)]
pub struct LogoutSignal {
    storage: Arc<dyn SharedStorage>,
    last_seen: Mutex<Option<String>>,
}

impl LogoutSignal {
    pub fn new(storage: Arc<dyn SharedStorage>) -> Self {
        let current = storage.get_item(LOGOUT_SIGNAL_KEY).unwrap_or_else(|e| {
            tracing::warn!("Could not read logout signal: {}", e);
            None
        });
        Self {
            storage,
            last_seen: Mutex::new(current),
        }
    }

    pub fn storage(&self) -> &Arc<dyn SharedStorage> {
        &self.storage
    }

    /// Tell every other tab that this one logged out
    pub fn broadcast(&self) -> Result<String> {
        let value = chrono::Utc::now().timestamp_millis().to_string();
        let mut last_seen = self.lock()?;
        self.storage.set_item(LOGOUT_SIGNAL_KEY, &value)?;
        *last_seen = Some(value.clone());
        Ok(value)
    }

    /// Check for a new signal from another tab since the last check
    pub fn poll(&self) -> Result<bool> {
        let mut last_seen = self.lock()?;
        let current = self.storage.get_item(LOGOUT_SIGNAL_KEY)?;
        if current.is_some() && current != *last_seen {
            *last_seen = current;
            return Ok(true);
        }
        Ok(false)
    }

    /// Poll on an interval, calling `on_signal` for each new signal
    ///
    /// The task stops once `on_signal` returns `false`.
    pub fn watch<F>(self: Arc<Self>, every: Duration, on_signal: F) -> JoinHandle<()>
    where
        F: Fn() -> bool + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.poll() {
                    Ok(true) => {
                        if !on_signal() {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Logout signal poll failed: {}", e),
                }
            }
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.last_seen
            .lock()
            .map_err(|_| Error::Storage("logout signal lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_peer_broadcast_is_seen_once() {
        let shared = MemoryStorage::new();
        let tab_a = LogoutSignal::new(Arc::new(shared.clone()));
        let tab_b = LogoutSignal::new(Arc::new(shared));

        assert!(!tab_b.poll().unwrap());
        tab_a.broadcast().unwrap();
        assert!(tab_b.poll().unwrap());
        assert!(!tab_b.poll().unwrap());
    }

    #[test]
    fn test_own_broadcast_is_ignored() {
        let tab = LogoutSignal::new(Arc::new(MemoryStorage::new()));
        tab.broadcast().unwrap();
        assert!(!tab.poll().unwrap());
    }

    #[test]
    fn test_signal_from_before_start_is_ignored() {
        let shared = MemoryStorage::new();
        shared.set_item(LOGOUT_SIGNAL_KEY, "1").unwrap();

        let tab = LogoutSignal::new(Arc::new(shared));
        assert!(!tab.poll().unwrap());
    }

    #[test]
    fn test_broadcast_value_is_a_timestamp() {
        let shared = MemoryStorage::new();
        let tab = LogoutSignal::new(Arc::new(shared.clone()));
        let value = tab.broadcast().unwrap();

        assert!(value.parse::<i64>().unwrap() > 0);
        assert_eq!(shared.get_item(LOGOUT_SIGNAL_KEY).unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_watch_fires_callback() {
        let shared = MemoryStorage::new();
        let tab_a = LogoutSignal::new(Arc::new(shared.clone()));
        let tab_b = Arc::new(LogoutSignal::new(Arc::new(shared)));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = tab_b.watch(Duration::from_millis(5), move || tx.send(()).is_ok());

        tab_a.broadcast().unwrap();
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("signal not observed")
            .expect("watch task ended");
        handle.abort();
    }
}
