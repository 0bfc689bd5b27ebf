use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Deliver a notification for one article. `Ok` means delivered.
    async fn send(&self, title: &str, link: &str) -> Result<()>;
}

/// The text delivered for a new article.
pub fn render_message(title: &str, link: &str) -> String {
    format!("New article: {} - {}", title, link)
}
