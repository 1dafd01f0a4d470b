//! Plain-text rendering of notifications.
//!
//! Channels receive a subject line and a body. Slack posts both as one
//! message and email uses them as subject and text content.

use std::collections::BTreeMap;

use honeywatch_core::types::{SecurityEvent, Severity};

/// Events listed individually in a batch summary.
pub const SUMMARY_EVENT_LIMIT: usize = 10;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const RECOMMENDED_ACTIONS: [&str; 4] = [
    "Review the source IP and block if necessary",
    "Check for additional activity from this source",
    "Verify no real credentials were exposed",
    "Update honey token rotation schedule if needed",
];

/// `[HIGH] Security Alert: Bulk Download`
pub fn event_subject(event: &SecurityEvent) -> String {
    format!(
        "[{}] Security Alert: {}",
        event.severity.as_str().to_uppercase(),
        event.event_type.title()
    )
}

pub fn event_body(event: &SecurityEvent) -> String {
    let severity = event.severity.as_str().to_uppercase();
    let mut lines = vec![
        format!("Severity: {severity}"),
        format!("Event Type: {}", event.event_type.title()),
        format!("Source IP: {}", event.source_ip),
    ];
    if !event.region.is_empty() {
        lines.push(format!("Region: {}", event.region));
    }
    lines.push(format!("Timestamp: {}", event.timestamp.format(TIME_FORMAT)));
    lines.push(format!("Resource: {}", event.resource));

    if !event.details.is_empty() {
        lines.push("\nDetails:".to_owned());
        lines.extend(
            event
                .details
                .iter()
                .map(|(key, value)| format!("  {}: {value}", title_case(key))),
        );
    }

    lines.push("\nRecommended Actions:".to_owned());
    lines.extend(RECOMMENDED_ACTIONS.iter().map(|action| format!("  - {action}")));
    join_lines(lines)
}

/// `Security Alert Summary: 3 Events Detected`
pub fn summary_subject(count: usize) -> String {
    format!("Security Alert Summary: {count} Events Detected")
}

/// Totals by severity (critical first), then the first
/// [`SUMMARY_EVENT_LIMIT`] events and a count of the rest.
pub fn summary_body(events: &[SecurityEvent]) -> String {
    let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.severity).or_default() += 1;
    }

    let mut lines = vec![
        format!("Detected {} security events", events.len()),
        "\nEvents by Severity:".to_owned(),
    ];
    lines.extend(Severity::DESCENDING.iter().filter_map(|severity| {
        counts
            .get(severity)
            .map(|count| format!("  {}: {count}", severity.as_str().to_uppercase()))
    }));

    lines.push("\nEvent Details:".to_owned());
    lines.extend(events.iter().take(SUMMARY_EVENT_LIMIT).map(|event| {
        format!(
            "  - {} | IP: {} | Time: {}",
            event.event_type.title(),
            event.source_ip,
            event.timestamp.format(TIME_FORMAT)
        )
    }));
    if events.len() > SUMMARY_EVENT_LIMIT {
        lines.push(format!("... and {} more events", events.len() - SUMMARY_EVENT_LIMIT));
    }
    join_lines(lines)
}

/// Newline-terminated lines.
fn join_lines(lines: Vec<String>) -> String {
    let mut body = lines.join("\n");
    body.push('\n');
    body
}

/// `download_count` -> `Download Count`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
