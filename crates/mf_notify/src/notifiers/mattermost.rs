use async_trait::async_trait;
use mf_core::{render_message, Error, Notifier, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use url::Url;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of an incoming-webhook post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub text: String,
}

/// Posts article notifications to a Mattermost incoming webhook.
#[derive(Debug, Clone)]
pub struct MattermostNotifier {
    client: reqwest::Client,
    webhook_url: Url,
}

impl MattermostNotifier {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Self::with_client(client, webhook_url)
    }

    pub fn with_client(client: reqwest::Client, webhook_url: &str) -> Result<Self> {
        let webhook_url = Url::parse(webhook_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", webhook_url, e)))?;
        Ok(Self { client, webhook_url })
    }

    /// Post `message` as-is. Only a 200 response counts as delivered.
    pub async fn send_message(&self, message: &str) -> Result<()> {
        let payload = WebhookMessage {
            text: message.to_string(),
        };

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notification(format!(
                "failed to send message, status: {}, response: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for MattermostNotifier {
    fn name(&self) -> &str {
        "mattermost"
    }

    async fn send(&self, title: &str, link: &str) -> Result<()> {
        let message = render_message(title, link);
        info!("{}", message);
        self.send_message(&message).await
    }
}
