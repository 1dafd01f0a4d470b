//! 리소스 열거(포트 스캔형) 탐지

use std::collections::HashMap;

use chrono::TimeDelta;

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{group_by_ip, rate, round2, secs, span_secs};

/// 한 IP가 `port_scan_window_secs` 안에 `port_scan_resource_threshold`개
/// 이상의 서로 다른 리소스를 건드린 경우
///
/// 상태 코드와 무관하게 모든 요청을 셉니다.
pub struct PortScanningDetector;

impl Detector for PortScanningDetector {
    fn event_type(&self) -> EventType {
        EventType::PortScanning
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        let window = secs(thresholds.port_scan_window_secs);
        let threshold = thresholds.port_scan_resource_threshold;

        group_by_ip(entries, |_| true)
            .into_iter()
            .filter_map(|(ip, requests)| {
                let (burst, unique) = first_wide_window(&requests, threshold, window)?;

                let first = burst.first()?;
                let last = burst.last()?;
                let span = span_secs(first.timestamp, last.timestamp);

                let mut event = SecurityEvent::new(
                    self.event_type(),
                    last.timestamp,
                    ip,
                    format!("{unique} resources"),
                )
                .with_detail("unique_resources", unique)
                .with_detail("total_requests", burst.len())
                .with_detail("time_span", round2(span));
                if let Some(r) = rate(unique as f64, span) {
                    event = event.with_detail("scan_rate", r);
                }
                Some(event)
            })
            .collect()
    }
}

/// 시작 엔트리부터 `window` 안의 고유 리소스 수가 처음 `threshold`에 닿는 창
///
/// 두 포인터로 창을 밀며 리소스별 개수를 유지하므로 그룹 크기에 선형입니다.
fn first_wide_window<'g, 'a>(
    sorted: &'g [&'a AccessLogEntry],
    threshold: usize,
    window: TimeDelta,
) -> Option<(&'g [&'a AccessLogEntry], usize)> {
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    let mut end = 0;

    for start in 0..sorted.len() {
        let origin = sorted[start].timestamp;
        while end < sorted.len() && sorted[end].timestamp - origin <= window {
            *counts.entry(sorted[end].resource.as_str()).or_insert(0) += 1;
            end += 1;
        }
        if counts.len() >= threshold {
            return Some((&sorted[start..end], counts.len()));
        }

        let leaving = sorted[start].resource.as_str();
        if let Some(count) = counts.get_mut(leaving) {
            *count -= 1;
            if *count == 0 {
                counts.remove(leaving);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use honeywatch_core::types::{DetailValue, Severity};

    fn scan_hit(ip: &str, offset: i64, n: usize) -> AccessLogEntry {
        with_status(with_resource(entry(ip, offset), &format!("scan/{n}.txt")), 404)
    }

    #[test]
    fn fires_on_wide_enumeration() {
        let entries: Vec<_> = (0..25).map(|i| scan_hit("192.0.2.66", i * 2, i as usize)).collect();
        let events = PortScanningDetector.detect(&entries, &Thresholds::default());

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.resource, "25 resources");
        assert_eq!(event.details["unique_resources"], DetailValue::Integer(25));
        assert_eq!(event.details["time_span"], DetailValue::Float(48.0));
    }

    #[test]
    fn repeated_single_resource_is_not_a_scan() {
        let entries: Vec<_> = (0..40).map(|i| entry("192.0.2.66", i)).collect();
        assert!(PortScanningDetector.detect(&entries, &Thresholds::default()).is_empty());
    }

    #[test]
    fn enumeration_spread_over_time_does_not_fire() {
        // 20개 리소스를 10분 간격으로
        let entries: Vec<_> = (0..20).map(|i| scan_hit("192.0.2.66", i * 600, i as usize)).collect();
        assert!(PortScanningDetector.detect(&entries, &Thresholds::default()).is_empty());
    }

    #[test]
    fn later_window_can_qualify() {
        let mut entries = vec![scan_hit("192.0.2.66", 0, 999)];
        entries.extend((0..20).map(|i| scan_hit("192.0.2.66", 1000 + i, i as usize)));
        let events = PortScanningDetector.detect(&entries, &Thresholds::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details["total_requests"], DetailValue::Integer(20));
    }

    #[test]
    fn threshold_resources_fire_one_less_does_not() {
        // 19개 -> 없음, 20개 -> 1건 (기본 임계값 20)
        let nineteen: Vec<_> = (0..19).map(|i| scan_hit("192.0.2.66", i, i as usize)).collect();
        assert!(PortScanningDetector.detect(&nineteen, &Thresholds::default()).is_empty());

        let twenty: Vec<_> = (0..20).map(|i| scan_hit("192.0.2.66", i, i as usize)).collect();
        let events = PortScanningDetector.detect(&twenty, &Thresholds::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details["unique_resources"], DetailValue::Integer(20));
    }

    #[test]
    fn window_bound_is_inclusive() {
        // 20개 리소스가 정확히 120초 -> 탐지, 121초 -> 미탐지
        let spread = |last: i64| -> Vec<AccessLogEntry> {
            (0..20)
                .map(|i| scan_hit("192.0.2.66", if i == 19 { last } else { i }, i as usize))
                .collect()
        };
        let events = PortScanningDetector.detect(&spread(120), &Thresholds::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details["time_span"], DetailValue::Float(120.0));
        assert!(PortScanningDetector.detect(&spread(121), &Thresholds::default()).is_empty());
    }

    #[test]
    fn resources_leaving_the_window_stop_counting() {
        // 같은 리소스 반복은 고유 수를 늘리지 않고, 창을 벗어난 리소스는 빠진다
        let mut entries: Vec<_> = (0..10).map(|i| scan_hit("192.0.2.66", i, i as usize)).collect();
        entries.extend((0..10).map(|i| scan_hit("192.0.2.66", 500 + i, 100 + i as usize)));
        entries.extend((0..30).map(|i| scan_hit("192.0.2.66", 510 + i, 100)));
        assert!(PortScanningDetector.detect(&entries, &Thresholds::default()).is_empty());
    }

    #[test]
    fn large_single_source_group_completes() {
        // 고유 리소스 하나짜리 5만 건: 선형 시간 안에 끝나야 함
        let entries: Vec<_> = (0..50_000).map(|i| scan_hit("192.0.2.66", i / 10, 0)).collect();
        assert!(PortScanningDetector.detect(&entries, &Thresholds::default()).is_empty());
    }
}
