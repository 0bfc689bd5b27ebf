use async_trait::async_trait;
use mf_core::{Error, Result, SeenRecord, SeenStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Non-durable ledger. Records vanish with the process.
#[derive(Default)]
pub struct MemorySeenStore {
    records: RwLock<HashMap<String, SeenRecord>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<SeenRecord> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.records.read().await.contains_key(id))
    }

    async fn record(&self, record: &SeenRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(Error::Duplicate(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, title: &str) -> SeenRecord {
        SeenRecord {
            id: id.to_string(),
            title: title.to_string(),
            link: format!("https://example.com/{}", id),
            seen_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySeenStore::new();
        assert!(!store.exists("b1").await.unwrap());

        store.record(&record("b1", "First")).await.unwrap();
        assert!(store.exists("b1").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_without_overwrite() {
        let store = MemorySeenStore::new();
        store.record(&record("b1", "First")).await.unwrap();

        let err = store.record(&record("b1", "Second")).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate(id) if id == "b1"));
        assert_eq!(store.get("b1").await.unwrap().title, "First");
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
