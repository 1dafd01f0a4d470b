//! `honeywatch events` command handler

use std::io::Write;
use std::path::Path;

use chrono::{TimeDelta, Utc};
use colored::Colorize;
use honeywatch_alerting::{JsonFileEventStore, query};
use honeywatch_core::types::{SecurityEvent, Severity, TimeRange};
use serde::Serialize;
use tracing::info;

use crate::cli::EventsArgs;
use crate::commands::{hours_to_secs, load_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render, write_event_row};

/// Execute the `events` command.
pub async fn execute(
    args: EventsArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let limit = args.limit.unwrap_or(config.store.query_limit);
    let min_severity = args
        .min_severity
        .as_deref()
        .map(|raw| {
            Severity::from_str_loose(raw)
                .ok_or_else(|| CliError::Command(format!("unknown severity '{raw}'")))
        })
        .transpose()?;
    let lookback = i64::try_from(hours_to_secs(args.hours)?)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| CliError::Command(format!("--hours {} is out of range", args.hours)))?;
    let range = TimeRange::ending_at(Utc::now(), lookback);

    let store = JsonFileEventStore::open(config.store.path.as_str()).await?;
    info!(store = %store.path().display(), %range, limit, "querying stored events");

    let events = match min_severity {
        None => query(&store, &range, limit).await?,
        Some(min) => query(&store, &range, usize::MAX)
            .await?
            .into_iter()
            .filter(|event| event.severity >= min)
            .take(limit)
            .collect(),
    };
    writer.render(&EventList { range, limit, events })?;
    Ok(())
}

/// Stored events inside a time range, newest first.
#[derive(Serialize)]
pub struct EventList {
    pub range: TimeRange,
    pub limit: usize,
    pub events: Vec<SecurityEvent>,
}

impl Render for EventList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Stored events ({})", self.range)?;

        if self.events.is_empty() {
            writeln!(w, "  {}", "no events".dimmed())?;
            return Ok(());
        }

        for event in &self.events {
            write_event_row(w, event)?;
            writeln!(w)?;
        }
        if self.events.len() == self.limit {
            writeln!(w, "  (limit of {} reached, use --limit to see more)", self.limit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use honeywatch_core::types::EventType;

    fn range() -> TimeRange {
        let end = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        TimeRange::ending_at(end, TimeDelta::hours(24))
    }

    #[test]
    fn empty_list_says_so() {
        let list = EventList {
            range: range(),
            limit: 10,
            events: Vec::new(),
        };
        let mut buffer = Vec::new();
        list.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("no events"));
    }

    #[test]
    fn full_page_mentions_limit() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 11, 0, 0).unwrap();
        let list = EventList {
            range: range(),
            limit: 1,
            events: vec![SecurityEvent::new(
                EventType::PortScanning,
                at,
                "198.51.100.7",
                "25 resources",
            )],
        };
        let mut buffer = Vec::new();
        list.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("port_scanning"));
        assert!(output.contains("2024-01-15 11:00:00"));
        assert!(output.contains("limit of 1 reached"));
    }
}
