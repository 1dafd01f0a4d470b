use std::time::Duration;

use honeywatch_core::error::ChannelError;
use honeywatch_core::pipeline::NotificationChannel;
use serde_json::json;

use super::{check_response, http_client};

const NAME: &str = "slack";

/// Slack incoming webhook.
///
/// Posts `{"text": "*subject*\nbody"}` and accepts any 2xx answer.
pub struct SlackWebhookChannel {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhookChannel {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        Ok(Self {
            client: http_client(NAME, timeout)?,
            webhook_url: webhook_url.into(),
        })
    }
}

impl NotificationChannel for SlackWebhookChannel {
    fn name(&self) -> &str {
        NAME
    }

    fn is_configured(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), ChannelError> {
        let payload = json!({ "text": format!("*{subject}*\n{body}") });
        let response = self.client.post(&self.webhook_url).json(&payload).send().await;
        check_response(NAME, response, |status| status.is_success()).await
    }
}
