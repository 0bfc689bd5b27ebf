use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single feed entry as returned by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    /// True when the article carries a publish date strictly after `cutoff`.
    pub fn published_after(&self, cutoff: DateTime<Utc>) -> bool {
        self.published_at.map_or(false, |published| published > cutoff)
    }
}

/// Ledger entry written once an article has been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub id: String,
    pub title: String,
    pub link: String,
    pub seen_at: DateTime<Utc>,
}

impl SeenRecord {
    pub fn from_article(article: &Article, seen_at: DateTime<Utc>) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            link: article.link.clone(),
            seen_at,
        }
    }
}

/// Counters for one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub feeds: usize,
    pub fetch_failures: usize,
    pub articles: usize,
    pub offered: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub lookup_failures: usize,
    pub record_failures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(published_at: Option<DateTime<Utc>>) -> Article {
        Article {
            id: "a1".to_string(),
            title: "Title".to_string(),
            link: "https://example.com/a1".to_string(),
            published_at,
        }
    }

    #[test]
    fn test_published_after_is_strict() {
        let cutoff = Utc::now();
        assert!(article(Some(cutoff + Duration::seconds(1))).published_after(cutoff));
        assert!(!article(Some(cutoff)).published_after(cutoff));
        assert!(!article(Some(cutoff - Duration::hours(1))).published_after(cutoff));
    }

    #[test]
    fn test_undated_article_is_never_after() {
        assert!(!article(None).published_after(Utc::now() - Duration::days(365)));
    }

    #[test]
    fn test_seen_record_copies_article_fields() {
        let now = Utc::now();
        let record = SeenRecord::from_article(&article(Some(now)), now);
        assert_eq!(record.id, "a1");
        assert_eq!(record.link, "https://example.com/a1");
        assert_eq!(record.seen_at, now);
    }
}
