use async_trait::async_trait;
use mf_core::{Error, Observer, Result, SeenRecord, SeenStore};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::open_with_retry;

pub const DEFAULT_DB_PATH: &str = "matterfeed.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS seen_articles (
        id TEXT PRIMARY KEY,
        title TEXT,
        link TEXT,
        date TEXT
    )
    "#,
    // Add future migrations here
];

pub struct SQLiteSeenStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SQLiteSeenStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .pragma("cache_size", "2000")
            .pragma("temp_store", "memory");

        // One connection keeps every write on the same handle.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| map_sqlx_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    /// Open the database, retrying while it reports itself locked or busy.
    pub async fn open(db_path: &Path, observer: &dyn Observer) -> Result<Self> {
        open_with_retry(observer, || Self::new_with_path(db_path)).await
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    pub async fn get(&self, id: &str) -> Result<Option<SeenRecord>> {
        let row = sqlx::query("SELECT id, title, link, date FROM seen_articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to load seen article", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let date: String = row.get("date");
        let seen_at = chrono::DateTime::parse_from_rfc3339(&date)
            .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))?
            .with_timezone(&chrono::Utc);

        Ok(Some(SeenRecord {
            id: row.get("id"),
            title: row.get::<Option<String>, _>("title").unwrap_or_default(),
            link: row.get::<Option<String>, _>("link").unwrap_or_default(),
            seen_at,
        }))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SeenStore for SQLiteSeenStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        let found: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM seen_articles WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("Failed to query seen articles", e))?;
        Ok(found != 0)
    }

    async fn record(&self, record: &SeenRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO seen_articles (id, title, link, date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.link)
        .bind(record.seen_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::Duplicate(record.id.clone()))
            }
            Err(e) => Err(map_sqlx_error("Failed to insert seen article", e)),
        }
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to count seen articles", e))?;
        Ok(count.max(0) as u64)
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6) are transient, as is waiting too long for the pool.
fn map_sqlx_error(context: &str, err: sqlx::Error) -> Error {
    let transient = match &err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5") | Some("6"))
                || db.message().contains("database is locked")
        }
        _ => false,
    };

    if transient {
        Error::StoreBusy(format!("{}: {}", context, err))
    } else {
        Error::Database(format!("{}: {}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mf_core::NullObserver;
    use tempfile::tempdir;

    fn record(id: &str) -> SeenRecord {
        SeenRecord {
            id: id.to_string(),
            title: format!("Title {}", id),
            link: format!("https://example.com/{}", id),
            seen_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let store = SQLiteSeenStore::new_with_path(&db_path).await.unwrap();
        assert!(!store.exists("b1").await.unwrap());

        let seen = record("b1");
        store.record(&seen).await.unwrap();
        assert!(store.exists("b1").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        let loaded = store.get("b1").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Title b1");
        assert_eq!(loaded.link, "https://example.com/b1");
        assert_eq!(loaded.seen_at.timestamp(), seen.seen_at.timestamp());
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let store = SQLiteSeenStore::new_with_path(&temp_dir.path().join("dup.db"))
            .await
            .unwrap();

        store.record(&record("b1")).await.unwrap();
        let mut again = record("b1");
        again.title = "Changed".to_string();

        let err = store.record(&again).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate(id) if id == "b1"));
        assert_eq!(store.get("b1").await.unwrap().unwrap().title, "Title b1");
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("ledger.db");

        let store = SQLiteSeenStore::open(&db_path, &NullObserver).await.unwrap();
        store.record(&record("a1")).await.unwrap();
        store.record(&record("a2")).await.unwrap();
        store.close().await;
        drop(store);

        let reopened = SQLiteSeenStore::open(&db_path, &NullObserver).await.unwrap();
        assert_eq!(reopened.get_db_path(), db_path.as_path());
        assert!(reopened.exists("a1").await.unwrap());
        assert!(reopened.exists("a2").await.unwrap());
        assert_eq!(reopened.count().await.unwrap(), 2);
    }
}
