use async_trait::async_trait;
use crate::types::SeenRecord;
use crate::Result;

#[async_trait]
pub trait SeenStore: Send + Sync {
    /// True iff a record with this id has been committed
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Insert a new record. Fails with `Error::Duplicate` when the id is already present.
    async fn record(&self, record: &SeenRecord) -> Result<()>;

    /// Number of committed records
    async fn count(&self) -> Result<u64>;
}
