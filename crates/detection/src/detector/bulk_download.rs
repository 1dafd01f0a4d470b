//! 대량 다운로드 탐지

use std::collections::BTreeSet;

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{group_by_ip, round2, span_secs};

/// 한 IP가 성공한 GET을 `bulk_threshold`건 이상 보낸 경우
pub struct BulkDownloadDetector;

impl Detector for BulkDownloadDetector {
    fn event_type(&self) -> EventType {
        EventType::BulkDownload
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        group_by_ip(entries, AccessLogEntry::is_successful_get)
            .into_iter()
            .filter(|(_, downloads)| downloads.len() >= thresholds.bulk_threshold)
            .filter_map(|(ip, downloads)| {
                let first = downloads.first()?;
                let last = downloads.last()?;
                let unique: BTreeSet<&str> =
                    downloads.iter().map(|e| e.resource.as_str()).collect();
                let noun = if unique.len() == 1 { "file" } else { "files" };

                Some(
                    SecurityEvent::new(
                        self.event_type(),
                        last.timestamp,
                        ip,
                        format!("{} {noun}", unique.len()),
                    )
                    .with_detail("download_count", downloads.len())
                    .with_detail("unique_resources", unique.len())
                    .with_detail(
                        "time_span",
                        round2(span_secs(first.timestamp, last.timestamp)),
                    ),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use honeywatch_core::types::{DetailValue, Operation, Severity};

    fn downloads(ip: &str, n: i64) -> Vec<AccessLogEntry> {
        (0..n)
            .map(|i| with_resource(entry(ip, i), &format!("file-{i}.txt")))
            .collect()
    }

    #[test]
    fn below_threshold_does_not_fire() {
        let events = BulkDownloadDetector.detect(&downloads("10.0.0.1", 9), &Thresholds::default());
        assert!(events.is_empty(), "9 downloads must stay under the default threshold");
    }

    #[test]
    fn at_threshold_fires_exactly_once() {
        let events = BulkDownloadDetector.detect(&downloads("10.0.0.1", 10), &Thresholds::default());
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.source_ip, "10.0.0.1");
        assert_eq!(event.resource, "10 files");
        assert_eq!(event.timestamp, t(9), "timestamp is the last contributing entry");
        assert_eq!(event.details["download_count"], DetailValue::Integer(10));
        assert_eq!(event.details["time_span"], DetailValue::Float(9.0));
    }

    #[test]
    fn ignores_failed_and_non_get_requests() {
        let mut entries = downloads("10.0.0.1", 8);
        entries.push(with_status(entry("10.0.0.1", 20), 403));
        let mut head = entry("10.0.0.1", 21);
        head.operation = Operation::Head;
        entries.push(head);

        let events = BulkDownloadDetector.detect(&entries, &Thresholds::default());
        assert!(events.is_empty());
    }

    #[test]
    fn groups_per_ip() {
        let mut entries = downloads("10.0.0.1", 10);
        entries.extend(downloads("10.0.0.2", 5));
        entries.extend(downloads("", 20));

        let events = BulkDownloadDetector.detect(&entries, &Thresholds::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_ip, "10.0.0.1");
    }
}
