use async_trait::async_trait;
use std::time::Duration;
use crate::types::Article;
use crate::{Error, Result};

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the feed at `url`, preserving entry order
    async fn fetch(&self, url: &str) -> Result<Vec<Article>>;
}

/// Longest accepted rescan interval; larger values overflow timer arithmetic.
pub const MAX_RESCAN_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// The feeds one engine polls and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSetConfig {
    pub urls: Vec<String>,
    pub rescan_interval: Duration,
}

impl FeedSetConfig {
    pub fn new(urls: Vec<String>, rescan_interval: Duration) -> Self {
        Self { urls, rescan_interval }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rescan_interval.is_zero() {
            return Err(Error::Config("rescan interval must be greater than zero".to_string()));
        }
        if self.rescan_interval > MAX_RESCAN_INTERVAL {
            return Err(Error::Config(format!(
                "rescan interval must be at most {}s",
                MAX_RESCAN_INTERVAL.as_secs()
            )));
        }
        if self.urls.is_empty() {
            return Err(Error::Config("at least one feed URL is required".to_string()));
        }
        Ok(())
    }
}
