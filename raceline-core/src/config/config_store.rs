//! Shared, reloadable configuration value.
//!
//! Holders of a [`ConfigStore`] read the current value; long-running tasks
//! additionally keep a [`ConfigWatcher`] and re-read when it fires.

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, watch};

/// A versioned configuration value with change notification.
pub struct ConfigStore<T> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T> {
    data: RwLock<T>,
    version_tx: watch::Sender<u64>,
}

/// Wakes up when the [`ConfigStore`] it came from is updated.
pub struct ConfigWatcher {
    version_rx: watch::Receiver<u64>,
}

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        let (version_tx, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(StoreInner {
                data: RwLock::new(initial),
                version_tx,
            }),
        }
    }

    /// Replace the stored value and notify all watchers.
    pub async fn update(&self, value: T) {
        let mut guard = self.inner.data.write().await;
        *guard = value;
        // Release the write lock before waking watchers so they can read.
        drop(guard);
        self.inner.version_tx.send_modify(|version| *version += 1);
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }

    /// Copy of the current value.
    pub async fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.data.read().await.clone()
    }

    /// Number of updates applied so far.
    pub fn version(&self) -> u64 {
        *self.inner.version_tx.borrow()
    }

    pub fn subscribe(&self) -> ConfigWatcher {
        ConfigWatcher {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ConfigWatcher {
    /// Wait until the store is updated.
    ///
    /// Returns `Err` once the [`ConfigStore`] has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.version_rx.changed().await
    }
}
