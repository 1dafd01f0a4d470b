//! End-to-end: log files on disk -> detection -> JSON-lines store -> channels.

use std::sync::{Arc, Mutex};

use chrono::{TimeDelta, TimeZone, Utc};
use honeywatch_alerting::{
    AlertDispatcher, AnalysisPass, DeliveryOutcome, JsonFileEventStore, NotificationKind, query,
};
use honeywatch_core::config::HoneywatchConfig;
use honeywatch_core::error::ChannelError;
use honeywatch_core::pipeline::NotificationChannel;
use honeywatch_core::types::{EventType, Severity, TimeRange};
use honeywatch_detection::FileLogSource;

#[derive(Clone, Default)]
struct RecordingChannel {
    sent: Arc<Mutex<Vec<String>>>,
}

impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, subject: &str, _body: &str) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(subject.to_owned());
        Ok(())
    }
}

struct RejectingChannel;

impl NotificationChannel for RejectingChannel {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, _subject: &str, _body: &str) -> Result<(), ChannelError> {
        Err(ChannelError::Rejected {
            channel: "rejecting".to_owned(),
            status: 500,
            body: "internal error".to_owned(),
        })
    }
}

/// 25 denied requests of distinct keys from one scanner within 50 seconds, unevenly spaced.
fn scanner_log() -> String {
    (0..25)
        .map(|i| {
            format!(
                r#"owner honey-bucket [15/Jan/2024:12:30:{:02} +0000] 198.51.100.77 - REQ{i} REST.GET.OBJECT scan/key-{i}.pem "GET /honey-bucket/scan/key-{i}.pem HTTP/1.1" 403 AccessDenied - - 2 1 "-" "python-requests/2.31.0" -"#,
                i * 2 + i % 3
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn repeated_runs_share_the_store_and_alert_once() {
    // Given: a log directory and an event file
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    tokio::fs::create_dir(&logs).await.unwrap();
    tokio::fs::write(logs.join("2024-01-15-12.log"), scanner_log()).await.unwrap();
    let store_path = dir.path().join("events.jsonl");

    let config = HoneywatchConfig::default();
    let now = Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap();
    let channel = RecordingChannel::default();
    let sent = Arc::clone(&channel.sent);

    // When: first run
    let first = {
        let store = JsonFileEventStore::open(&store_path).await.unwrap();
        let pass = AnalysisPass::from_config(
            &config,
            store,
            AlertDispatcher::new(vec![Box::new(channel.clone()), Box::new(RejectingChannel)]),
        );
        pass.run(&FileLogSource::new(&logs), now).await.unwrap()
    };

    // Then
    let mut types: Vec<_> = first.events.iter().map(|u| u.event.event_type).collect();
    types.sort();
    assert_eq!(
        types,
        vec![
            EventType::RapidAccess,
            EventType::SuspiciousUserAgent,
            EventType::FailedAccessAttempts,
            EventType::CredentialStuffing,
            EventType::PortScanning,
        ]
    );
    assert_eq!(first.stored, 5);

    // failed access + credential stuffing are high, plus one summary
    let recorded = sent.lock().unwrap().clone();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[2], "Security Alert Summary: 5 Events Detected");

    let failures: Vec<_> = first
        .dispatch
        .records
        .iter()
        .filter(|r| matches!(r.outcome, DeliveryOutcome::Failed(_)))
        .collect();
    assert_eq!(failures.len(), 3, "rejecting channel fails every notification");
    assert!(failures.iter().all(|r| r.channel == "rejecting"));
    assert_eq!(
        first.dispatch.records.iter().filter(|r| r.kind == NotificationKind::Summary).count(),
        2
    );

    // When: second run in the same bucket, store reloaded from disk
    let store = JsonFileEventStore::open(&store_path).await.unwrap();
    let pass = AnalysisPass::from_config(&config, store, AlertDispatcher::new(vec![Box::new(channel)]));
    let second = pass
        .run(&FileLogSource::new(&logs), now + TimeDelta::minutes(5))
        .await
        .unwrap();

    // Then: all duplicates, no new notifications
    assert_eq!(second.duplicates, 5);
    assert_eq!(second.stored, 0);
    assert_eq!(sent.lock().unwrap().len(), 3);

    let window = TimeRange::ending_at(now, TimeDelta::hours(1));
    let stored = query(pass.store(), &window, 100).await.unwrap();
    assert_eq!(stored.len(), 5);
    assert!(stored.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert!(stored.iter().any(|e| e.severity == Severity::High));
}

#[tokio::test]
async fn missing_log_directory_fails_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileEventStore::open(dir.path().join("events.jsonl")).await.unwrap();
    let pass = AnalysisPass::from_config(&HoneywatchConfig::default(), store, AlertDispatcher::new(Vec::new()));

    let result = pass
        .run(&FileLogSource::new(dir.path().join("absent")), Utc::now())
        .await;
    assert!(result.is_err());
    assert!(pass.store().is_empty().await);
}
