//! Per-filename async locks
//!
//! Uploads of the same filename run one at a time; uploads of different
//! filenames never wait on each other. Entries are removed once no caller
//! holds or waits for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct FilenameLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl FilenameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other caller holds `filename`, then hold it until the
    /// returned guard is dropped.
    pub async fn acquire(&self, filename: &str) -> FilenameGuard {
        let lock = {
            let mut map = self.map();
            map.entry(filename.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = lock.lock_owned().await;

        FilenameGuard {
            locks: self.clone(),
            filename: filename.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of filenames currently locked or awaited.
    pub fn active(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, LockMap> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct FilenameGuard {
    locks: FilenameLocks,
    filename: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FilenameGuard {
    fn drop(&mut self) {
        self.guard.take();

        let mut map = self.locks.map();
        // Only the map's own reference left: nobody holds or awaits the lock.
        let idle = map
            .get(&self.filename)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            map.remove(&self.filename);
        }
    }
}
