//! 데이터 유출 탐지

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{group_by_ip, rate, round2, span_secs};

const MIB: f64 = 1024.0 * 1024.0;

/// 성공한 GET의 누적 전송량이 `exfiltration_threshold_bytes` 이상인 경우
///
/// 크기 정보가 없는 요청은 `default_object_bytes`로 추정합니다.
pub struct DataExfiltrationDetector;

impl Detector for DataExfiltrationDetector {
    fn event_type(&self) -> EventType {
        EventType::DataExfiltration
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        group_by_ip(entries, AccessLogEntry::is_successful_get)
            .into_iter()
            .filter_map(|(ip, downloads)| {
                let total_bytes = downloads.iter().fold(0u64, |acc, e| {
                    acc.saturating_add(e.bytes_estimate.unwrap_or(thresholds.default_object_bytes))
                });
                if total_bytes < thresholds.exfiltration_threshold_bytes {
                    return None;
                }

                let first = downloads.first()?;
                let last = downloads.last()?;
                let span = span_secs(first.timestamp, last.timestamp);
                let size_mb = total_bytes as f64 / MIB;
                let noun = if downloads.len() == 1 { "file" } else { "files" };

                let mut event = SecurityEvent::new(
                    self.event_type(),
                    last.timestamp,
                    ip,
                    format!("{} {noun}", downloads.len()),
                )
                .with_detail("total_bytes", total_bytes)
                .with_detail("total_size_mb", round2(size_mb))
                .with_detail("file_count", downloads.len())
                .with_detail("duration_seconds", round2(span));
                if let Some(r) = rate(size_mb, span) {
                    event = event.with_detail("transfer_rate_mbps", r);
                }
                Some(event)
            })
            .collect()
    }
}
