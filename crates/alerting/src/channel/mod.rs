//! Notification channels.
//!
//! Every channel implements [`NotificationChannel`]; the dispatcher holds them
//! as `Box<dyn DynNotificationChannel>` through the blanket impl in core.

mod email;
mod log;
mod slack;

pub use email::SendGridEmailChannel;
pub use log::LogChannel;
pub use slack::SlackWebhookChannel;

use std::time::Duration;

use honeywatch_core::config::AlertsConfig;
use honeywatch_core::error::ChannelError;
use honeywatch_core::pipeline::DynNotificationChannel;
use tracing::info;

/// Builds the channels enabled in `config`, in a fixed order: log, slack, email.
///
/// Returns no channels when alerts are disabled altogether.
pub fn build_channels(
    config: &AlertsConfig,
) -> Result<Vec<Box<dyn DynNotificationChannel>>, ChannelError> {
    let mut channels: Vec<Box<dyn DynNotificationChannel>> = Vec::new();
    if !config.enabled {
        info!("alerts disabled, no notification channels built");
        return Ok(channels);
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);

    if config.log_channel {
        channels.push(Box::new(LogChannel::new()));
    }
    if config.slack.enabled {
        channels.push(Box::new(SlackWebhookChannel::new(
            config.slack.webhook_url.clone(),
            timeout,
        )?));
    }
    if config.email.enabled {
        channels.push(Box::new(SendGridEmailChannel::from_config(
            &config.email,
            timeout,
        )?));
    }

    info!(
        channels = ?channels.iter().map(|c| c.name()).collect::<Vec<_>>(),
        "notification channels ready"
    );
    Ok(channels)
}

/// HTTP client shared by the webhook-style channels.
pub(crate) fn http_client(channel: &str, timeout: Duration) -> Result<reqwest::Client, ChannelError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("honeywatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ChannelError::Transport {
            channel: channel.to_owned(),
            reason: format!("failed to build http client: {e}"),
        })
}

/// Bytes of a rejection body kept in the error.
const REJECTED_BODY_LIMIT: usize = 512;

/// Cuts `text` to at most `max` bytes without splitting a character.
fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let cut = (0..=max).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
    text.truncate(cut);
}

/// Maps a finished request to the channel result.
pub(crate) async fn check_response(
    channel: &str,
    response: Result<reqwest::Response, reqwest::Error>,
    accept: impl Fn(reqwest::StatusCode) -> bool,
) -> Result<(), ChannelError> {
    let response = response.map_err(|e| ChannelError::Transport {
        channel: channel.to_owned(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if accept(status) {
        return Ok(());
    }

    let mut body = response.text().await.unwrap_or_default();
    truncate_on_char_boundary(&mut body, REJECTED_BODY_LIMIT);
    Err(ChannelError::Rejected {
        channel: channel.to_owned(),
        status: status.as_u16(),
        body,
    })
}
