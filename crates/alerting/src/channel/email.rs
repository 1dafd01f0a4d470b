use std::time::Duration;

use honeywatch_core::config::EmailConfig;
use honeywatch_core::error::ChannelError;
use honeywatch_core::pipeline::NotificationChannel;
use reqwest::StatusCode;
use serde_json::json;

use super::{check_response, http_client};

const NAME: &str = "email";

/// SendGrid v3 `mail/send`.
///
/// SendGrid answers `202 Accepted` for a queued message. Any other status is
/// treated as a rejection.
pub struct SendGridEmailChannel {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
    to_addresses: Vec<String>,
}

impl SendGridEmailChannel {
    pub fn from_config(config: &EmailConfig, timeout: Duration) -> Result<Self, ChannelError> {
        Ok(Self {
            client: http_client(NAME, timeout)?,
            api_url: config.api_url.clone(),
            api_key: config.sendgrid_api_key.clone(),
            from_address: config.from_address.clone(),
            to_addresses: config.to_addresses.clone(),
        })
    }

    fn payload(&self, subject: &str, body: &str) -> serde_json::Value {
        let to: Vec<_> = self
            .to_addresses
            .iter()
            .map(|email| json!({ "email": email }))
            .collect();
        json!({
            "personalizations": [{ "to": to }],
            "from": { "email": self.from_address },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        })
    }
}

impl NotificationChannel for SendGridEmailChannel {
    fn name(&self) -> &str {
        NAME
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
            && !self.from_address.is_empty()
            && !self.to_addresses.is_empty()
            && !self.api_url.is_empty()
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(subject, body))
            .send()
            .await;
        check_response(NAME, response, |status| status == StatusCode::ACCEPTED).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::test_server::respond_once;

    fn config(api_url: String) -> EmailConfig {
        EmailConfig {
            enabled: true,
            sendgrid_api_key: "SG.test-key".to_owned(),
            from_address: "honeywatch@example.com".to_owned(),
            to_addresses: vec!["soc@example.com".to_owned(), "oncall@example.com".to_owned()],
            api_url,
        }
    }

    #[test]
    fn missing_recipients_is_unconfigured() {
        let mut cfg = config("https://api.sendgrid.com/v3/mail/send".to_owned());
        assert!(SendGridEmailChannel::from_config(&cfg, Duration::from_secs(1)).unwrap().is_configured());

        cfg.to_addresses.clear();
        assert!(!SendGridEmailChannel::from_config(&cfg, Duration::from_secs(1)).unwrap().is_configured());
    }

    #[test]
    fn payload_lists_every_recipient() {
        let channel =
            SendGridEmailChannel::from_config(&config(String::new()), Duration::from_secs(1)).unwrap();
        let payload = channel.payload("subject", "body");
        assert_eq!(payload["personalizations"][0]["to"][1]["email"], "oncall@example.com");
        assert_eq!(payload["from"]["email"], "honeywatch@example.com");
        assert_eq!(payload["content"][0]["value"], "body");
    }

    #[tokio::test]
    async fn accepted_is_success_with_bearer_auth() {
        let (url, server) = respond_once(202, "Accepted", "").await;
        let channel = SendGridEmailChannel::from_config(&config(url), Duration::from_secs(5)).unwrap();

        channel.send("Security Alert Summary: 2 Events Detected", "Detected 2 security events").await.unwrap();

        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("authorization: bearer sg.test-key"));
    }

    #[tokio::test]
    async fn plain_ok_is_not_accepted() {
        let (url, server) = respond_once(200, "OK", "").await;
        let channel = SendGridEmailChannel::from_config(&config(url), Duration::from_secs(5)).unwrap();

        let err = channel.send("s", "b").await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, ChannelError::Rejected { status: 200, .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v3/mail/send", listener.local_addr().unwrap());
        drop(listener);

        let channel = SendGridEmailChannel::from_config(&config(url), Duration::from_secs(5)).unwrap();
        let err = channel.send("s", "b").await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport { .. }));
    }
}
