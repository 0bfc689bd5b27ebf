use async_trait::async_trait;
use mf_core::{render_message, Notifier, Result};
use tracing::info;

/// Logs the rendered message instead of delivering it. Always succeeds.
#[derive(Debug, Default)]
pub struct DryRunNotifier;

impl DryRunNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for DryRunNotifier {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn send(&self, title: &str, link: &str) -> Result<()> {
        info!("(dry run) {}", render_message(title, link));
        Ok(())
    }
}
