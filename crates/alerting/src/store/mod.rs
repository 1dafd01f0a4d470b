//! Event store adapter.
//!
//! Every detected [`SecurityEvent`] is persisted under a deterministic identity
//! derived from its type, source IP and the analysis window bucket. Overlapping
//! windows that fall into the same bucket therefore map a re-detected condition
//! onto the record that already exists, and the adapter reports it as
//! [`UpsertOutcome::Duplicate`] instead of alerting again.
//!
//! ```text
//! AnalysisPass ──▶ StoreAdapter ──▶ EventStore (trait)
//!                                     │      │
//!                                     ▼      ▼
//!                               Memory    JSON lines file
//! ```

mod file;
mod memory;

pub use file::JsonFileEventStore;
pub use memory::MemoryEventStore;

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use honeywatch_core::error::StoreError;
use honeywatch_core::metrics as hw_metrics;
use honeywatch_core::pipeline::{EventStore, StoredEvent};
use honeywatch_core::types::{EventType, SecurityEvent, TimeRange};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// The identity was new and the event has been persisted.
    Stored,
    /// An event with the same identity already exists. Nothing was written.
    Duplicate,
}

impl UpsertOutcome {
    pub fn is_stored(self) -> bool {
        matches!(self, Self::Stored)
    }
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => write!(f, "stored"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Deterministic identity of an event within a window bucket.
///
/// Lower-case hex SHA-256 of `"{event_type}|{source_ip}|{bucket}"` with the
/// bucket rendered as RFC 3339 in UTC.
pub fn event_identity(event_type: EventType, source_ip: &str, bucket: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(event_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(source_ip.as_bytes());
    hasher.update(b"|");
    hasher.update(bucket.to_rfc3339_opts(SecondsFormat::Secs, true).as_bytes());
    hex::encode(hasher.finalize())
}

/// Store adapter scoped to a single analysis window.
pub struct StoreAdapter<'s, S> {
    store: &'s S,
    bucket: DateTime<Utc>,
}

impl<'s, S: EventStore> StoreAdapter<'s, S> {
    /// Scopes the adapter to `window`, bucketing its start by `granularity_secs`.
    pub fn for_window(store: &'s S, window: &TimeRange, granularity_secs: u64) -> Self {
        Self {
            store,
            bucket: window.bucket_start(granularity_secs),
        }
    }

    /// The window bucket every identity is derived from.
    pub fn bucket(&self) -> DateTime<Utc> {
        self.bucket
    }

    /// Identity the given event would be stored under.
    pub fn identity_of(&self, event: &SecurityEvent) -> String {
        event_identity(event.event_type, &event.source_ip, self.bucket)
    }

    /// Persists `event` unless its identity is already present.
    pub async fn upsert(&self, event: &SecurityEvent) -> Result<UpsertOutcome, StoreError> {
        let id = self.identity_of(event);
        let stored = self
            .store
            .put_if_absent(StoredEvent {
                id: id.clone(),
                event: event.clone(),
            })
            .await?;

        let outcome = if stored {
            metrics::counter!(hw_metrics::STORE_EVENTS_STORED_TOTAL).increment(1);
            UpsertOutcome::Stored
        } else {
            metrics::counter!(hw_metrics::STORE_DUPLICATES_TOTAL).increment(1);
            UpsertOutcome::Duplicate
        };
        debug!(
            event_id = %id,
            event_type = event.event_type.as_str(),
            source_ip = %event.source_ip,
            %outcome,
            "event upserted"
        );
        Ok(outcome)
    }
}

/// Events with a timestamp inside `range`, newest first, at most `limit`.
pub async fn query<S: EventStore>(
    store: &S,
    range: &TimeRange,
    limit: usize,
) -> Result<Vec<SecurityEvent>, StoreError> {
    let mut records = store.scan(range).await?;
    records.sort_by(|a, b| {
        b.event
            .timestamp
            .cmp(&a.event.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(records
        .into_iter()
        .take(limit)
        .map(|record| record.event)
        .collect())
}

impl<S: EventStore> StoreAdapter<'_, S> {
    /// Same as the free [`query`] function, against the adapter's store.
    pub async fn query(&self, range: &TimeRange, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        query(self.store, range, limit).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    fn event(ip: &str, ts: DateTime<Utc>) -> SecurityEvent {
        SecurityEvent::new(EventType::BulkDownload, ts, ip, "12 files").with_detail("download_count", 12u64)
    }

    #[test]
    fn identity_is_stable_lower_hex() {
        let a = event_identity(EventType::BulkDownload, "10.0.0.1", at(12, 0));
        let b = event_identity(EventType::BulkDownload, "10.0.0.1", at(12, 0));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn identity_differs_by_each_component() {
        let base = event_identity(EventType::BulkDownload, "10.0.0.1", at(12, 0));
        assert_ne!(base, event_identity(EventType::RapidAccess, "10.0.0.1", at(12, 0)));
        assert_ne!(base, event_identity(EventType::BulkDownload, "10.0.0.2", at(12, 0)));
        assert_ne!(base, event_identity(EventType::BulkDownload, "10.0.0.1", at(13, 0)));
    }

    #[test]
    fn overlapping_windows_share_a_bucket() {
        let store = MemoryEventStore::new();
        let first = TimeRange::ending_at(at(13, 5), TimeDelta::hours(1));
        let second = TimeRange::ending_at(at(13, 10), TimeDelta::hours(1));

        let a = StoreAdapter::for_window(&store, &first, 3600);
        let b = StoreAdapter::for_window(&store, &second, 3600);
        assert_eq!(a.bucket(), at(12, 0));
        assert_eq!(a.identity_of(&event("10.0.0.1", at(12, 30))), b.identity_of(&event("10.0.0.1", at(12, 59))));
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = MemoryEventStore::new();
        let window = TimeRange::ending_at(at(13, 0), TimeDelta::hours(1));
        let adapter = StoreAdapter::for_window(&store, &window, 3600);

        let e = event("10.0.0.1", at(12, 30));
        assert_eq!(adapter.upsert(&e).await.unwrap(), UpsertOutcome::Stored);
        assert_eq!(adapter.upsert(&e).await.unwrap(), UpsertOutcome::Duplicate);
        assert_eq!(store.len(), 1, "exactly one record after duplicate upsert");
    }

    #[tokio::test]
    async fn concurrent_upserts_yield_one_stored() {
        let store = MemoryEventStore::new();
        let window = TimeRange::ending_at(at(13, 0), TimeDelta::hours(1));
        let adapter = StoreAdapter::for_window(&store, &window, 3600);
        let e = event("10.0.0.1", at(12, 30));

        let outcomes = futures::future::join_all((0..8).map(|_| adapter.upsert(&e))).await;
        let stored = outcomes
            .into_iter()
            .filter(|o| matches!(o, Ok(UpsertOutcome::Stored)))
            .count();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn query_orders_newest_first_and_limits() {
        let store = MemoryEventStore::new();
        let window = TimeRange::ending_at(at(13, 0), TimeDelta::hours(1));
        let adapter = StoreAdapter::for_window(&store, &window, 3600);
        for (ip, minute) in [("10.0.0.1", 10), ("10.0.0.2", 40), ("10.0.0.3", 25)] {
            adapter.upsert(&event(ip, at(12, minute))).await.unwrap();
        }

        let events = adapter.query(&window, 2).await.unwrap();
        let ips: Vec<_> = events.iter().map(|e| e.source_ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.2", "10.0.0.3"]);

        let later = TimeRange::new(at(12, 30), at(13, 0));
        assert_eq!(adapter.query(&later, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = mock::UnavailableStore;
        let window = TimeRange::ending_at(at(13, 0), TimeDelta::hours(1));
        let adapter = StoreAdapter::for_window(&store, &window, 3600);

        let err = adapter.upsert(&event("10.0.0.1", at(12, 30))).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(adapter.query(&window, 10).await.is_err());
    }
}
