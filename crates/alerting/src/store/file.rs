use std::collections::HashMap;
use std::path::{Path, PathBuf};

use honeywatch_core::error::StoreError;
use honeywatch_core::pipeline::{EventStore, StoredEvent};
use honeywatch_core::types::TimeRange;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Event store backed by a JSON-lines file.
///
/// The whole file is indexed when the store is opened, and every new record is
/// appended as one JSON document per line. Identities therefore stay
/// deduplicated across separate process invocations that share the file.
///
/// A last line left without its newline by an interrupted write is repaired on
/// open: kept if it still parses, cut off otherwise.
pub struct JsonFileEventStore {
    path: PathBuf,
    /// Held across the append so the check and the write are one step.
    index: Mutex<HashMap<String, StoredEvent>>,
}

impl JsonFileEventStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let index = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let (index, tail) = parse_lines(&path, &content)?;
                repair_tail(&path, tail).await?;
                index
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        info!(path = %path.display(), records = index.len(), "event store opened");
        Ok(Self {
            path,
            index: Mutex::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records currently indexed.
    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn append(&self, line: &str) -> Result<(), StoreError> {
        let unavailable =
            |e: std::io::Error| StoreError::Unavailable(format!("{}: {e}", self.path.display()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(unavailable)?;
        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(unavailable)?;
        file.flush().await.map_err(unavailable)
    }
}

/// State of the file's last line after indexing.
#[derive(Debug, PartialEq, Eq)]
enum Tail {
    Clean,
    /// Complete record without its newline.
    Unterminated,
    /// Unparseable partial record starting at this byte offset.
    Torn(u64),
}

fn parse_lines(path: &Path, content: &str) -> Result<(HashMap<String, StoredEvent>, Tail), StoreError> {
    let mut index = HashMap::new();
    let mut tail = Tail::Clean;
    let mut offset = 0usize;

    for (number, chunk) in content.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += chunk.len();
        let terminated = chunk.ends_with('\n');
        let line = chunk.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<StoredEvent>(line) {
            Ok(record) => {
                if !terminated {
                    tail = Tail::Unterminated;
                }
                index.entry(record.id.clone()).or_insert(record);
            }
            Err(e) if !terminated => {
                warn!(
                    path = %path.display(),
                    line = number + 1,
                    error = %e,
                    "dropping partially written last record"
                );
                tail = Tail::Torn(start as u64);
            }
            Err(e) => {
                return Err(StoreError::Serialization(format!(
                    "{}:{}: {e}",
                    path.display(),
                    number + 1
                )));
            }
        }
    }
    Ok((index, tail))
}

/// Leaves the file ending on a newline so the next append starts a fresh line.
async fn repair_tail(path: &Path, tail: Tail) -> Result<(), StoreError> {
    let unavailable =
        |e: std::io::Error| StoreError::Unavailable(format!("{}: {e}", path.display()));

    match tail {
        Tail::Clean => Ok(()),
        Tail::Unterminated => {
            let mut file = tokio::fs::OpenOptions::new()
                .append(true)
                .open(path)
                .await
                .map_err(unavailable)?;
            file.write_all(b"\n").await.map_err(unavailable)?;
            file.flush().await.map_err(unavailable)
        }
        Tail::Torn(intact_len) => {
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .open(path)
                .await
                .map_err(unavailable)?;
            file.set_len(intact_len).await.map_err(unavailable)
        }
    }
}

impl EventStore for JsonFileEventStore {
    async fn put_if_absent(&self, record: StoredEvent) -> Result<bool, StoreError> {
        let mut index = self.index.lock().await;
        if index.contains_key(&record.id) {
            return Ok(false);
        }

        let line =
            serde_json::to_string(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.append(&line).await?;
        debug!(event_id = %record.id, path = %self.path.display(), "event appended");
        index.insert(record.id.clone(), record);
        Ok(true)
    }

    async fn scan(&self, range: &TimeRange) -> Result<Vec<StoredEvent>, StoreError> {
        let index = self.index.lock().await;
        Ok(index
            .values()
            .filter(|record| range.contains(record.event.timestamp))
            .cloned()
            .collect())
    }
}
