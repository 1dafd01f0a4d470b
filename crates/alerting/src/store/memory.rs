use std::collections::HashMap;
use std::sync::Mutex;

use honeywatch_core::error::StoreError;
use honeywatch_core::pipeline::{EventStore, StoredEvent};
use honeywatch_core::types::TimeRange;

/// In-process event store.
///
/// The conditional insert happens under a single lock, so of several
/// concurrent writers for one identity exactly one observes `true`.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    records: Mutex<HashMap<String, StoredEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_owned())
    }
}

impl EventStore for MemoryEventStore {
    async fn put_if_absent(&self, record: StoredEvent) -> Result<bool, StoreError> {
        let mut records = self.records.lock().map_err(|_| Self::poisoned())?;
        if records.contains_key(&record.id) {
            return Ok(false);
        }
        records.insert(record.id.clone(), record);
        Ok(true)
    }

    async fn scan(&self, range: &TimeRange) -> Result<Vec<StoredEvent>, StoreError> {
        let records = self.records.lock().map_err(|_| Self::poisoned())?;
        Ok(records
            .values()
            .filter(|record| range.contains(record.event.timestamp))
            .cloned()
            .collect())
    }
}
