use mf_core::{Error, Event, Observer, Result, SeenStore};
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub mod backends;

pub use backends::*;

/// Attempts made before store initialisation is declared fatal.
pub const MAX_OPEN_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Sqlite => "sqlite",
            StorageKind::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageKind::Sqlite),
            "memory" => Ok(StorageKind::Memory),
            other => Err(Error::Config(format!(
                "Unknown storage backend: {} (expected sqlite or memory)",
                other
            ))),
        }
    }
}

/// Run `open` up to [`MAX_OPEN_ATTEMPTS`] times with a linear backoff of
/// `attempt` seconds. Only transient errors are retried.
pub async fn open_with_retry<T, F, Fut>(observer: &dyn Observer, mut open: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..MAX_OPEN_ATTEMPTS {
        match open().await {
            Ok(store) => return Ok(store),
            Err(e) if e.is_transient() => {
                observer.observe(Event::StoreRetry {
                    attempt: attempt + 1,
                    max_attempts: MAX_OPEN_ATTEMPTS,
                    error: e.to_string(),
                });
                last_error = Some(e);
                if attempt + 1 < MAX_OPEN_ATTEMPTS {
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::Database(format!(
        "Failed to initialize storage after {} attempts: {}",
        MAX_OPEN_ATTEMPTS,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Build the seen-article store selected by `kind`. `path` is ignored for memory storage.
pub async fn create_storage(
    kind: StorageKind,
    path: &Path,
    observer: &dyn Observer,
) -> Result<Arc<dyn SeenStore>> {
    let store: Arc<dyn SeenStore> = match kind {
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => Arc::new(SQLiteSeenStore::open(path, observer).await?),
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            let _ = path;
            return Err(Error::Config(
                "SQLite storage requires the `sqlite` feature".to_string(),
            ));
        }
        StorageKind::Memory => Arc::new(MemorySeenStore::new()),
    };

    let records = store.count().await?;
    observer.observe(Event::StoreOpened {
        backend: kind.to_string(),
        records,
    });
    Ok(store)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::Recorder;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_storage_kind_from_str() {
        assert_eq!("sqlite".parse::<StorageKind>().unwrap(), StorageKind::Sqlite);
        assert_eq!("Memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert!("qdrant".parse::<StorageKind>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_busy() {
        let recorder = Recorder::new();
        let calls = AtomicU32::new(0);

        let value = open_with_retry(&recorder, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::StoreBusy("database is locked".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            recorder.count_matching(|e| matches!(e, Event::StoreRetry { .. })),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_five_attempts() {
        let recorder = Recorder::new();
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<()> = open_with_retry(&recorder, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::StoreBusy("database is locked".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_OPEN_ATTEMPTS);
        // 0 + 1 + 2 + 3 seconds of backoff between the five attempts
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(6) && waited < Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = open_with_retry(&mf_core::NullObserver, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Database("disk I/O error".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::Database(msg)) if msg == "disk I/O error"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_memory_storage_reports_open() {
        let recorder = Recorder::new();
        let store = create_storage(StorageKind::Memory, Path::new("unused.db"), &recorder)
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(
            recorder.events(),
            vec![Event::StoreOpened {
                backend: "memory".to_string(),
                records: 0
            }]
        );
    }
}
