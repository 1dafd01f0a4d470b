//! 짧은 시간 내 연속 접근 탐지

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{first_dense_window, group_by_ip, rate, resource_summary, round2, secs, span_secs};

/// `rapid_threshold`건이 `rapid_window_secs` 안에 몰린 경우
///
/// 모든 요청 종류를 셉니다. IP마다 처음 만족한 창 하나만 보고합니다.
pub struct RapidAccessDetector;

impl Detector for RapidAccessDetector {
    fn event_type(&self) -> EventType {
        EventType::RapidAccess
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        let window = secs(thresholds.rapid_window_secs);

        group_by_ip(entries, |_| true)
            .into_iter()
            .filter_map(|(ip, group)| {
                let burst = first_dense_window(&group, thresholds.rapid_threshold, window)?;
                let first = burst.first()?;
                let last = burst.last()?;
                let span = span_secs(first.timestamp, last.timestamp);

                let mut event = SecurityEvent::new(
                    self.event_type(),
                    last.timestamp,
                    ip,
                    resource_summary(burst),
                )
                .with_detail("access_count", burst.len())
                .with_detail("time_span", round2(span))
                .with_detail("window_secs", thresholds.rapid_window_secs)
                .with_detail("first_access", first.timestamp.to_rfc3339())
                .with_detail("last_access", last.timestamp.to_rfc3339());
                if let Some(r) = rate(burst.len() as f64, span) {
                    event = event.with_detail("access_rate", r);
                }
                Some(event)
            })
            .collect()
    }
}
