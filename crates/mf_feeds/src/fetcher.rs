use async_trait::async_trait;
use feed_rs::parser;
use mf_core::{Article, Error, FeedFetcher, Result};
use std::time::Duration;

const USER_AGENT: &str = concat!("matterfeed/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches feeds over HTTP and parses them with `feed-rs`.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<Article>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Feed(format!("{} returned status {}", url, status)));
        }

        let body = response.bytes().await?;
        parse_feed(&body).map_err(|e| match e {
            Error::Feed(msg) => Error::Feed(format!("{}: {}", url, msg)),
            other => other,
        })
    }
}

/// Parse an RSS, Atom or JSON feed document into articles, keeping entry order.
///
/// Entries without a publish date fall back to their updated date; entries
/// with neither keep `published_at = None`.
pub fn parse_feed(body: &[u8]) -> Result<Vec<Article>> {
    let feed = parser::parse(body).map_err(|e| Error::Feed(format!("failed to parse feed: {}", e)))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| Article {
            title: entry.title.map(|t| t.content.trim().to_string()).unwrap_or_default(),
            link: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
            published_at: entry.published.or(entry.updated),
            id: entry.id,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <link>https://blog.example.com</link>
    <description>Posts</description>
    <item>
      <title>Second post</title>
      <link>https://blog.example.com/second</link>
      <guid>post-2</guid>
      <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>First post</title>
      <link>https://blog.example.com/first</link>
      <guid>post-1</guid>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>https://blog.example.com/undated</link>
      <guid>post-0</guid>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <id>urn:uuid:feed</id>
  <updated>2024-03-01T12:00:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:uuid:entry-1</id>
    <link href="https://atom.example.com/entry-1"/>
    <updated>2024-03-01T12:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_keeps_order_and_fields() {
        let articles = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(articles.len(), 3);

        assert_eq!(articles[0].id, "post-2");
        assert_eq!(articles[0].title, "Second post");
        assert_eq!(articles[0].link, "https://blog.example.com/second");
        assert_eq!(
            articles[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap())
        );
        assert_eq!(articles[1].id, "post-1");
        assert_eq!(articles[2].published_at, None);
    }

    #[test]
    fn test_parse_atom_falls_back_to_updated() {
        let articles = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "urn:uuid:entry-1");
        assert_eq!(articles[0].link, "https://atom.example.com/entry-1");
        assert_eq!(
            articles[0].published_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_feed(b"not a feed"), Err(Error::Feed(_))));
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let base = serve(
            Router::new()
                .route("/feed.xml", get(|| async { RSS }))
                .route("/gone", get(|| async { StatusCode::NOT_FOUND })),
        )
        .await;
        let fetcher = HttpFeedFetcher::new().unwrap();

        let articles = fetcher.fetch(&format!("{}/feed.xml", base)).await.unwrap();
        assert_eq!(articles.len(), 3);

        let err = fetcher.fetch(&format!("{}/gone", base)).await.unwrap_err();
        assert!(matches!(err, Error::Feed(msg) if msg.contains("404")));
    }
}
