use honeywatch_core::error::ChannelError;
use honeywatch_core::pipeline::NotificationChannel;
use tracing::warn;

/// Writes notifications to the tracing log. Always configured.
#[derive(Debug, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), ChannelError> {
        warn!(target: "honeywatch::alert", %subject, %body, "security alert");
        Ok(())
    }
}
