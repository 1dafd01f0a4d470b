//! 실패한 접근 시도 탐지

use std::collections::BTreeSet;

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{group_by_ip, resource_summary, round2, span_secs};

/// 실패로 간주하는 상태 코드
const FAILURE_STATUSES: [u16; 3] = [401, 403, 404];

/// 401/403/404 응답이 `failed_attempts_threshold`건 이상인 경우
pub struct FailedAccessDetector;

impl Detector for FailedAccessDetector {
    fn event_type(&self) -> EventType {
        EventType::FailedAccessAttempts
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        group_by_ip(entries, |e| FAILURE_STATUSES.contains(&e.http_status))
            .into_iter()
            .filter(|(_, group)| group.len() >= thresholds.failed_attempts_threshold)
            .filter_map(|(ip, group)| {
                let first = group.first()?;
                let last = group.last()?;
                let codes: BTreeSet<u16> = group.iter().map(|e| e.http_status).collect();
                let codes = codes
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(",");

                Some(
                    SecurityEvent::new(self.event_type(), last.timestamp, ip, resource_summary(&group))
                        .with_detail("failure_count", group.len())
                        .with_detail("status_codes", codes)
                        .with_detail(
                            "time_span",
                            round2(span_secs(first.timestamp, last.timestamp)),
                        ),
                )
            })
            .collect()
    }
}
