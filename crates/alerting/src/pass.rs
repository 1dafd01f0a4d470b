//! One analysis pass: fetch, detect, store, notify.
//!
//! ```text
//! LogSource::fetch(window) ─▶ DetectorEngine ─▶ StoreAdapter::upsert ─▶ AlertDispatcher
//!        │                                            │
//!   IngestionError                               StoreError
//!   (abort, nothing stored)                      (notify what was stored, abort)
//! ```
//!
//! Every event is upserted before any notification goes out, so a store
//! failure never produces an alert for an event that was not persisted. When
//! the store fails partway through, the events it already accepted are still
//! dispatched: a later pass sees them as duplicates and would never notify.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use honeywatch_core::config::{HoneywatchConfig, Thresholds};
use honeywatch_core::error::PassError;
use honeywatch_core::metrics as hw_metrics;
use honeywatch_core::pipeline::{EventStore, LogSource};
use honeywatch_core::types::{EventType, TimeRange};
use honeywatch_detection::{ConcurrentRun, DetectorEngine};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dispatcher::{AlertDispatcher, DispatchReport, UpsertedEvent};
use crate::store::{StoreAdapter, UpsertOutcome};

/// Summary of a completed pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub window: TimeRange,
    /// Normalized entries inside the window.
    pub entries: usize,
    pub events_detected: usize,
    /// Detectors whose task failed; their events are missing from this pass.
    pub failed_detectors: Vec<EventType>,
    pub stored: usize,
    pub duplicates: usize,
    /// Every detected event with its identity and store outcome.
    pub events: Vec<UpsertedEvent>,
    pub dispatch: DispatchReport,
}

pub struct AnalysisPass<S> {
    engine: DetectorEngine,
    thresholds: Arc<Thresholds>,
    store: S,
    dispatcher: AlertDispatcher,
    lookback: TimeDelta,
    bucket_granularity_secs: u64,
    region: String,
}

impl<S: EventStore> AnalysisPass<S> {
    /// Builds a pass from the loaded configuration.
    pub fn from_config(config: &HoneywatchConfig, store: S, dispatcher: AlertDispatcher) -> Self {
        Self {
            engine: DetectorEngine::default(),
            thresholds: Arc::new(config.detection.clone()),
            store,
            dispatcher,
            lookback: lookback(config.analysis.lookback_secs),
            bucket_granularity_secs: config.store.bucket_granularity_secs,
            region: config.analysis.region.clone(),
        }
    }

    /// Replaces the detector set.
    pub fn with_engine(mut self, engine: DetectorEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Analysis window for a pass ending at `now`.
    pub fn window_at(&self, now: DateTime<Utc>) -> TimeRange {
        TimeRange::ending_at(now, self.lookback)
    }

    /// Runs one pass over the window ending at `now`.
    pub async fn run<L: LogSource>(&self, source: &L, now: DateTime<Utc>) -> Result<PassReport, PassError> {
        let started = Instant::now();
        let result = self.run_inner(source, now).await;

        let label = match &result {
            Ok(_) => "ok",
            Err(PassError::Ingestion(_)) => "ingestion_error",
            Err(PassError::Store(_)) => "store_error",
        };
        metrics::counter!(hw_metrics::PASS_RUNS_TOTAL, hw_metrics::LABEL_RESULT => label).increment(1);
        metrics::histogram!(hw_metrics::PASS_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            error!(source = source.name(), error = %e, "analysis pass failed");
        }
        result
    }

    async fn run_inner<L: LogSource>(&self, source: &L, now: DateTime<Utc>) -> Result<PassReport, PassError> {
        let pass_id = Uuid::new_v4();
        let window = self.window_at(now);
        info!(%pass_id, source = source.name(), %window, "analysis pass started");

        let entries = source.fetch(&window).await?;
        let entry_count = entries.len();

        let ConcurrentRun {
            events: detected,
            failed_detectors,
        } = self
            .engine
            .run_all_concurrent(Arc::from(entries), Arc::clone(&self.thresholds))
            .await;
        let events_detected = detected.len();

        let adapter = StoreAdapter::for_window(&self.store, &window, self.bucket_granularity_secs);
        let mut events = Vec::with_capacity(detected.len());
        for event in detected {
            let event = if event.region.is_empty() {
                event.with_region(self.region.as_str())
            } else {
                event
            };
            let outcome = match adapter.upsert(&event).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.dispatch_partial(pass_id, &events).await;
                    return Err(e.into());
                }
            };
            events.push(UpsertedEvent {
                id: adapter.identity_of(&event),
                event,
                outcome,
            });
        }

        let stored = events.iter().filter(|u| u.outcome == UpsertOutcome::Stored).count();
        let duplicates = events.len() - stored;

        let dispatch = self.dispatcher.dispatch(&events).await;

        info!(
            %pass_id,
            entries = entry_count,
            events = events_detected,
            stored,
            duplicates,
            notifications = dispatch.sent(),
            "analysis pass finished"
        );

        Ok(PassReport {
            pass_id,
            window,
            entries: entry_count,
            events_detected,
            failed_detectors,
            stored,
            duplicates,
            events,
            dispatch,
        })
    }
}

impl<S> AnalysisPass<S> {
    /// Notifies the events stored before a store failure cut the pass short.
    async fn dispatch_partial(&self, pass_id: Uuid, events: &[UpsertedEvent]) {
        let stored = events.iter().filter(|u| u.outcome.is_stored()).count();
        if stored == 0 {
            return;
        }
        warn!(%pass_id, stored, "store failed mid-pass, notifying events already stored");
        let dispatch = self.dispatcher.dispatch(events).await;
        info!(%pass_id, notifications = dispatch.sent(), failed = dispatch.failed(), "partial dispatch finished");
    }
}

fn lookback(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::MockChannel;
    use crate::store::MemoryEventStore;
    use crate::store::mock::UnavailableStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use honeywatch_core::error::{IngestionError, StoreError};
    use honeywatch_core::pipeline::StoredEvent;
    use honeywatch_core::types::{AccessLogEntry, Operation};

    struct StaticSource(Vec<AccessLogEntry>);

    impl LogSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, window: &TimeRange) -> Result<Vec<AccessLogEntry>, IngestionError> {
            Ok(self.0.iter().filter(|e| window.contains(e.timestamp)).cloned().collect())
        }
    }

    struct DownSource;

    impl LogSource for DownSource {
        fn name(&self) -> &str {
            "down"
        }

        async fn fetch(&self, _window: &TimeRange) -> Result<Vec<AccessLogEntry>, IngestionError> {
            Err(IngestionError::Unavailable {
                source_name: "down".to_owned(),
                reason: "bucket not found".to_owned(),
            })
        }
    }

    /// Memory store whose `fail_on`-th insert (1-based) fails once.
    struct FlakyStore {
        inner: MemoryEventStore,
        calls: AtomicUsize,
        fail_on: usize,
    }

    impl FlakyStore {
        fn failing_on(fail_on: usize) -> Self {
            Self {
                inner: MemoryEventStore::new(),
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    impl EventStore for FlakyStore {
        async fn put_if_absent(&self, record: StoredEvent) -> Result<bool, StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(StoreError::Unavailable("transient".to_owned()));
            }
            self.inner.put_if_absent(record).await
        }

        async fn scan(&self, range: &TimeRange) -> Result<Vec<StoredEvent>, StoreError> {
            self.inner.scan(range).await
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 13, 5, 0).unwrap()
    }

    /// 12 successful curl GETs spanning exactly 30 seconds after 12:40.
    fn curl_burst() -> Vec<AccessLogEntry> {
        let seconds = [0, 1, 3, 4, 8, 9, 15, 16, 22, 23, 29, 30];
        seconds
            .iter()
            .map(|&s| AccessLogEntry {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 12, 40, 0).unwrap() + TimeDelta::seconds(s),
                source_ip: "203.0.113.50".to_owned(),
                resource: "credentials/aws_keys.json".to_owned(),
                operation: Operation::Get,
                http_status: 200,
                user_agent: "curl/7.68.0".to_owned(),
                bytes_estimate: Some(512),
            })
            .collect()
    }

    fn pass_with<S: EventStore>(store: S, channel: MockChannel) -> AnalysisPass<S> {
        AnalysisPass::from_config(
            &HoneywatchConfig::default(),
            store,
            AlertDispatcher::new(vec![Box::new(channel)]),
        )
    }

    #[tokio::test]
    async fn full_pass_stores_and_notifies() {
        let channel = MockChannel::new("slack");
        let sent = channel.sent();
        let pass = pass_with(MemoryEventStore::new(), channel);

        let report = pass.run(&StaticSource(curl_burst()), now()).await.unwrap();

        assert_eq!(report.entries, 12);
        assert_eq!(report.events_detected, 3);
        assert!(report.failed_detectors.is_empty());
        assert_eq!(report.stored, 3);
        assert_eq!(report.duplicates, 0);
        assert!(report.events.iter().all(|u| u.event.region == "us-east-1"));
        // bulk download is high: one immediate, then the summary of 3
        let subjects: Vec<String> = sent.lock().unwrap().iter().map(|(s, _)| s.clone()).collect();
        assert_eq!(
            subjects,
            vec![
                "[HIGH] Security Alert: Bulk Download".to_owned(),
                "Security Alert Summary: 3 Events Detected".to_owned(),
            ]
        );
        assert_eq!(pass.store().len(), 3);
    }

    #[tokio::test]
    async fn overlapping_pass_in_same_bucket_is_silent() {
        let channel = MockChannel::new("slack");
        let sent = channel.sent();
        let pass = pass_with(MemoryEventStore::new(), channel);
        let source = StaticSource(curl_burst());

        pass.run(&source, now()).await.unwrap();
        let second = pass.run(&source, now() + TimeDelta::minutes(5)).await.unwrap();

        assert_eq!(second.events_detected, 3);
        assert_eq!(second.stored, 0);
        assert_eq!(second.duplicates, 3);
        assert!(second.dispatch.is_empty());
        assert_eq!(sent.lock().unwrap().len(), 2, "no new notifications on re-detection");
    }

    #[tokio::test]
    async fn ingestion_failure_aborts_before_detection() {
        let channel = MockChannel::new("slack");
        let sent = channel.sent();
        let pass = pass_with(MemoryEventStore::new(), channel);

        let err = pass.run(&DownSource, now()).await.unwrap_err();
        assert!(matches!(err, PassError::Ingestion(_)));
        assert!(pass.store().is_empty());
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_aborts_before_dispatch() {
        let channel = MockChannel::new("slack");
        let sent = channel.sent();
        let pass = pass_with(UnavailableStore, channel);

        let err = pass.run(&StaticSource(curl_burst()), now()).await.unwrap_err();
        assert!(matches!(err, PassError::Store(StoreError::Unavailable(_))));
        assert!(sent.lock().unwrap().is_empty(), "nothing dispatched after a store failure");
    }

    #[tokio::test]
    async fn empty_window_is_a_quiet_success() {
        let pass = pass_with(MemoryEventStore::new(), MockChannel::new("slack"));
        let later = now() + TimeDelta::days(1);

        let report = pass.run(&StaticSource(curl_burst()), later).await.unwrap();
        assert_eq!(report.entries, 0);
        assert_eq!(report.events_detected, 0);
        assert!(report.dispatch.is_empty());
    }

    #[tokio::test]
    async fn custom_engine_limits_detectors() {
        let engine = DetectorEngine::new(vec![Arc::new(honeywatch_detection::detector::BulkDownloadDetector)]);
        let pass = pass_with(MemoryEventStore::new(), MockChannel::new("slack")).with_engine(engine);

        let report = pass.run(&StaticSource(curl_burst()), now()).await.unwrap();
        assert_eq!(report.events_detected, 1);
        assert_eq!(report.events[0].event.event_type, EventType::BulkDownload);
    }

    #[tokio::test]
    async fn store_failure_midway_still_notifies_stored_events() {
        // Given: the second insert fails, after bulk download was stored
        let channel = MockChannel::new("slack");
        let sent = channel.sent();
        let pass = pass_with(FlakyStore::failing_on(2), channel);
        let source = StaticSource(curl_burst());

        // When: the pass fails, then runs again in the same bucket
        let err = pass.run(&source, now()).await.unwrap_err();
        assert!(matches!(err, PassError::Store(StoreError::Unavailable(_))));
        let retry = pass.run(&source, now() + TimeDelta::minutes(5)).await.unwrap();

        // Then: the high event was alerted exactly once across both runs
        assert_eq!(retry.stored, 2);
        assert_eq!(retry.duplicates, 1);
        let subjects: Vec<String> = sent.lock().unwrap().iter().map(|(s, _)| s.clone()).collect();
        assert_eq!(
            subjects,
            vec![
                "[HIGH] Security Alert: Bulk Download".to_owned(),
                "Security Alert Summary: 2 Events Detected".to_owned(),
            ]
        );
    }
}
