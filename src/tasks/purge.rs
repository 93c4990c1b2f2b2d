//! Expired Value Purge Task
//!
//! Expired values are already invisible to reads; this task reclaims their
//! memory so idle regions do not hold on to stale entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::region::MemoryBackend;

/// Spawns a task purging expired values from `backend` every
/// `interval_secs` seconds.
///
/// The returned handle can be aborted on shutdown.
///
/// # Example
/// ```ignore
/// let backend = Arc::new(MemoryBackend::from_config(&config));
/// let purge = spawn_purge_task(backend.clone(), config.cleanup_interval);
/// // Later, during shutdown:
/// purge.abort();
/// ```
pub fn spawn_purge_task(backend: Arc<MemoryBackend>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs, "starting expired value purge task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = backend.purge_expired();
            if removed > 0 {
                info!(removed, "purged expired cache values");
            } else {
                debug!("no expired cache values to purge");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::CacheBackend;

    #[tokio::test]
    async fn test_purge_task_removes_expired_values() {
        let backend = Arc::new(MemoryBackend::new(100, 1024));
        backend.save("expire_soon", b"value".to_vec(), Some(Duration::from_millis(200)));

        let handle = spawn_purge_task(backend.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(backend.is_empty(), "expired value should have been purged");
        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_preserves_live_values() {
        let backend = Arc::new(MemoryBackend::new(100, 1024));
        backend.save("long_lived", b"value".to_vec(), Some(Duration::from_secs(3600)));
        backend.save("unlimited", b"value".to_vec(), None);

        let handle = spawn_purge_task(backend.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(backend.len(), 2);
        assert_eq!(backend.fetch("long_lived"), Some(b"value".to_vec()));
        handle.abort();
    }

    #[tokio::test]
    async fn test_purge_task_can_be_aborted() {
        let backend = Arc::new(MemoryBackend::new(100, 1024));
        let handle = spawn_purge_task(backend, 1);

        handle.abort();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "task should be finished after abort");
    }
}
