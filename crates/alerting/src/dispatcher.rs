//! Alert dispatcher.
//!
//! After a pass has stored its events, the dispatcher turns the *stored* ones
//! into notifications:
//!
//! - every stored high or critical event is sent on its own, to every channel;
//! - when more than one event was stored, one batch summary follows.
//!
//! Duplicates never notify. A failing channel is recorded in the
//! [`DispatchReport`] and the remaining channels and notifications proceed.
//! Sends of one notification fan out to all channels concurrently and are all
//! awaited before the next notification starts.

use std::fmt;

use futures::future::join_all;
use honeywatch_core::metrics as hw_metrics;
use honeywatch_core::pipeline::DynNotificationChannel;
use honeywatch_core::types::SecurityEvent;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::render;
use crate::store::UpsertOutcome;

/// An event together with its identity and what the store did with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertedEvent {
    pub id: String,
    pub event: SecurityEvent,
    pub outcome: UpsertOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Single high/critical event.
    Immediate,
    /// Batch summary of every event stored in the pass.
    Summary,
}

/// Result of one send attempt on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
    /// Channel is not configured; nothing was sent.
    Skipped,
}

impl DeliveryOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRecord {
    pub channel: String,
    pub subject: String,
    pub kind: NotificationKind,
    /// Identity of the notified event. `None` for summaries.
    pub event_id: Option<String>,
    pub outcome: DeliveryOutcome,
}

/// Every delivery attempt of one dispatch, in send order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchReport {
    pub records: Vec<DeliveryRecord>,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Skipped))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn count(&self, pred: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

struct Notification {
    kind: NotificationKind,
    event_id: Option<String>,
    subject: String,
    body: String,
}

pub struct AlertDispatcher {
    channels: Vec<Box<dyn DynNotificationChannel>>,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Box<dyn DynNotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Notifies about the stored events in `outcomes`.
    pub async fn dispatch(&self, outcomes: &[UpsertedEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.channels.is_empty() {
            debug!("no notification channels, dispatch skipped");
            return report;
        }

        for notification in plan(outcomes) {
            let attempts = self
                .channels
                .iter()
                .map(|channel| self.deliver(channel.as_ref(), &notification));
            report.records.extend(join_all(attempts).await);
        }

        if !report.is_empty() {
            info!(
                sent = report.sent(),
                failed = report.failed(),
                skipped = report.skipped(),
                "dispatch complete"
            );
        }
        report
    }

    async fn deliver(
        &self,
        channel: &dyn DynNotificationChannel,
        notification: &Notification,
    ) -> DeliveryRecord {
        let outcome = if !channel.is_configured() {
            debug!(channel = channel.name(), "channel not configured, skipping");
            DeliveryOutcome::Skipped
        } else {
            match channel.send(&notification.subject, &notification.body).await {
                Ok(()) => DeliveryOutcome::Sent,
                Err(e) => {
                    warn!(
                        channel = channel.name(),
                        subject = %notification.subject,
                        error = %e,
                        "notification failed"
                    );
                    DeliveryOutcome::Failed(e.to_string())
                }
            }
        };

        metrics::counter!(
            hw_metrics::ALERTS_NOTIFICATIONS_TOTAL,
            hw_metrics::LABEL_CHANNEL => channel.name().to_owned(),
            hw_metrics::LABEL_RESULT => outcome.label()
        )
        .increment(1);

        DeliveryRecord {
            channel: channel.name().to_owned(),
            subject: notification.subject.clone(),
            kind: notification.kind,
            event_id: notification.event_id.clone(),
            outcome,
        }
    }
}

/// Notifications owed for one pass, in send order.
fn plan(outcomes: &[UpsertedEvent]) -> Vec<Notification> {
    let stored: Vec<&UpsertedEvent> = outcomes.iter().filter(|u| u.outcome.is_stored()).collect();

    let mut notifications: Vec<Notification> = stored
        .iter()
        .filter(|u| u.event.severity.is_immediate())
        .map(|u| Notification {
            kind: NotificationKind::Immediate,
            event_id: Some(u.id.clone()),
            subject: render::event_subject(&u.event),
            body: render::event_body(&u.event),
        })
        .collect();

    if stored.len() > 1 {
        let events: Vec<SecurityEvent> = stored.iter().map(|u| u.event.clone()).collect();
        notifications.push(Notification {
            kind: NotificationKind::Summary,
            event_id: None,
            subject: render::summary_subject(events.len()),
            body: render::summary_body(&events),
        });
    }
    notifications
}
